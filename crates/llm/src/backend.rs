//! LLM backend implementations
//!
//! One-shot chat completion over HTTP. The wire shape is the only contract:
//! request `{model, messages, temperature, max_tokens}`, response
//! `choices[0].message.content`.

use async_trait::async_trait;
use blitsum_config::LlmSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// LLM errors
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One-shot LLM backend
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Generate a single assistant reply for the message list
    async fn generate(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// Model name for logging
    fn model_name(&self) -> &str;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: usize,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

/// HTTP backend speaking the one-shot chat completion shape
pub struct HttpLlmBackend {
    client: reqwest::Client,
    settings: LlmSettings,
    api_key: String,
}

impl HttpLlmBackend {
    pub fn new(settings: LlmSettings, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            client,
            settings,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl LlmBackend for HttpLlmBackend {
    async fn generate(&self, messages: &[Message]) -> Result<String, LlmError> {
        let body = CompletionRequest {
            model: &self.settings.model,
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "llm provider returned non-2xx");
            return Err(LlmError::Status(status.as_u16()));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::MalformedResponse("empty choices".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.settings.model
    }
}

/// Scripted backend for tests: returns canned replies in order, repeating
/// the last one when the script runs out
pub struct MockLlmBackend {
    replies: std::sync::Mutex<Vec<String>>,
    /// Messages seen by the last `generate` call
    last_messages: std::sync::Mutex<Vec<Message>>,
}

impl MockLlmBackend {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies),
            last_messages: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn single(reply: impl Into<String>) -> Self {
        Self::new(vec![reply.into()])
    }

    pub fn last_messages(&self) -> Vec<Message> {
        self.last_messages.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmBackend for MockLlmBackend {
    async fn generate(&self, messages: &[Message]) -> Result<String, LlmError> {
        if let Ok(mut last) = self.last_messages.lock() {
            *last = messages.to_vec();
        }
        let mut replies = self
            .replies
            .lock()
            .map_err(|_| LlmError::Transport("mock poisoned".to_string()))?;
        if replies.len() > 1 {
            Ok(replies.remove(0))
        } else {
            replies
                .first()
                .cloned()
                .ok_or_else(|| LlmError::MalformedResponse("mock exhausted".to_string()))
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend_scripted() {
        let backend = MockLlmBackend::new(vec!["first".to_string(), "second".to_string()]);
        let messages = vec![Message::user("hi")];
        assert_eq!(backend.generate(&messages).await.unwrap(), "first");
        assert_eq!(backend.generate(&messages).await.unwrap(), "second");
        // last reply repeats
        assert_eq!(backend.generate(&messages).await.unwrap(), "second");
        assert_eq!(backend.last_messages().len(), 1);
    }

    #[test]
    fn test_request_shape() {
        let messages = vec![Message::system("sys"), Message::user("hello")];
        let body = CompletionRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.7,
            max_tokens: 256,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_response_shape() {
        let parsed: CompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Hi there!"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content, "Hi there!");
    }
}
