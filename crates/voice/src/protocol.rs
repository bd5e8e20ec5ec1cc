//! TTS WebSocket wire protocol
//!
//! The client sends a voice config, then text with an end marker; it can
//! cancel a context with an empty-text end, or barge into the current turn
//! with a clear frame. The server streams base64 PCM/WAV audio frames,
//! a final-audio marker and error frames.

use serde::{Deserialize, Serialize};

/// Voice parameters sent once per context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub voice_id: String,
    pub style: String,
    pub sample_rate: u32,
    pub format: String,
    pub channel_type: String,
    pub encode_as_base64: bool,
    pub variation: u32,
}

impl VoiceConfig {
    pub fn new(voice_id: impl Into<String>, settings: &blitsum_config::TtsSettings) -> Self {
        Self {
            voice_id: voice_id.into(),
            style: settings.style.clone(),
            sample_rate: settings.sample_rate,
            format: settings.format.clone(),
            channel_type: settings.channel_type.clone(),
            encode_as_base64: true,
            variation: 1,
        }
    }
}

/// Messages sent by the client
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ClientMessage {
    Config {
        voice_config: VoiceConfig,
        context_id: String,
    },
    Text {
        text: String,
        context_id: String,
        end: bool,
    },
    Clear {
        #[serde(rename = "type")]
        kind: &'static str,
        context_id: String,
    },
}

impl ClientMessage {
    pub fn config(voice_config: VoiceConfig, context_id: impl Into<String>) -> Self {
        ClientMessage::Config {
            voice_config,
            context_id: context_id.into(),
        }
    }

    pub fn text(text: impl Into<String>, context_id: impl Into<String>) -> Self {
        ClientMessage::Text {
            text: text.into(),
            context_id: context_id.into(),
            end: true,
        }
    }

    /// Cancel a whole context: empty text with the end marker
    pub fn end_context(context_id: impl Into<String>) -> Self {
        ClientMessage::Text {
            text: String::new(),
            context_id: context_id.into(),
            end: true,
        }
    }

    /// Barge into the current turn
    pub fn clear(context_id: impl Into<String>) -> Self {
        ClientMessage::Clear {
            kind: "clear",
            context_id: context_id.into(),
        }
    }
}

/// Messages received from the server
#[derive(Debug, Clone, Deserialize)]
pub struct ServerMessage {
    /// Base64 PCM/WAV audio chunk
    pub audio: Option<String>,
    #[serde(rename = "isFinalAudio")]
    pub is_final_audio: Option<bool>,
    pub error: Option<String>,
}

impl ServerMessage {
    pub fn is_final(&self) -> bool {
        self.is_final_audio.unwrap_or(false)
    }
}

/// Build the TTS WebSocket URL with its query parameters
pub fn stream_url(
    settings: &blitsum_config::TtsSettings,
    api_key: &str,
) -> Result<url::Url, url::ParseError> {
    let mut url = url::Url::parse(&settings.endpoint)?;
    url.query_pairs_mut()
        .append_pair("api-key", api_key)
        .append_pair("model", &settings.model)
        .append_pair("sample_rate", &settings.sample_rate.to_string())
        .append_pair("channel_type", &settings.channel_type)
        .append_pair("format", &settings.format);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blitsum_config::TtsSettings;

    #[test]
    fn test_config_message_shape() {
        let settings = TtsSettings::default();
        let msg = ClientMessage::config(VoiceConfig::new("aria", &settings), "ctx-1");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["context_id"], "ctx-1");
        assert_eq!(json["voice_config"]["voiceId"], "aria");
        assert_eq!(json["voice_config"]["encodeAsBase64"], true);
        assert_eq!(json["voice_config"]["sampleRate"], 44100);
    }

    #[test]
    fn test_text_and_clear_shapes() {
        let text = serde_json::to_value(ClientMessage::text("Hello", "ctx")).unwrap();
        assert_eq!(text["text"], "Hello");
        assert_eq!(text["end"], true);

        let clear = serde_json::to_value(ClientMessage::clear("ctx")).unwrap();
        assert_eq!(clear["type"], "clear");

        let cancel = serde_json::to_value(ClientMessage::end_context("ctx")).unwrap();
        assert_eq!(cancel["text"], "");
        assert_eq!(cancel["end"], true);
    }

    #[test]
    fn test_server_message_parsing() {
        let audio: ServerMessage = serde_json::from_str(r#"{"audio":"AAAA"}"#).unwrap();
        assert!(audio.audio.is_some());
        assert!(!audio.is_final());

        let done: ServerMessage = serde_json::from_str(r#"{"isFinalAudio":true}"#).unwrap();
        assert!(done.is_final());

        let err: ServerMessage = serde_json::from_str(r#"{"error":"bad voice"}"#).unwrap();
        assert_eq!(err.error.as_deref(), Some("bad voice"));
    }

    #[test]
    fn test_stream_url_params() {
        let settings = TtsSettings::default();
        let url = stream_url(&settings, "key-123").unwrap();
        let query: std::collections::HashMap<_, _> = url.query_pairs().collect();
        assert_eq!(query["api-key"], "key-123");
        assert_eq!(query["sample_rate"], "44100");
        assert_eq!(query["format"], "WAV");
    }
}
