//! Embed configuration
//!
//! The host page calls `init(config)` with a JSON object; recognized keys
//! follow the embed contract (`llmApiKey`, `ttsApiKey`, `ttsVoiceId`,
//! `silenceThresholdMs`, `historyMax`). Everything else has defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },

    #[error("malformed config: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// LLM provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 256,
        }
    }
}

/// TTS vendor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TtsSettings {
    pub endpoint: String,
    pub model: String,
    pub sample_rate: u32,
    pub channel_type: String,
    pub format: String,
    pub style: String,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            endpoint: "wss://tts.blitsum.dev/v1/stream".to_string(),
            model: "falcon".to_string(),
            sample_rate: super::constants::voice::SAMPLE_RATE,
            channel_type: "MONO".to_string(),
            format: "WAV".to_string(),
            style: "Conversational".to_string(),
        }
    }
}

/// Voice mode settings derived from the embed config
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoiceSettings {
    pub silence_threshold_ms: u64,
    pub tts: TtsSettings,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            silence_threshold_ms: super::constants::voice::DEFAULT_SILENCE_THRESHOLD.as_millis()
                as u64,
            tts: TtsSettings::default(),
        }
    }
}

/// Top-level runtime configuration, the embed contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub llm_api_key: String,
    pub tts_api_key: String,
    #[serde(default)]
    pub tts_voice_id: Option<String>,
    #[serde(default)]
    pub silence_threshold_ms: Option<u64>,
    #[serde(default)]
    pub history_max: Option<usize>,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub voice: VoiceSettings,
}

impl RuntimeConfig {
    /// Parse an embed config object
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let mut config: RuntimeConfig = serde_json::from_str(raw)?;
        if let Some(ms) = config.silence_threshold_ms {
            config.voice.silence_threshold_ms = ms;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm_api_key.is_empty() {
            return Err(ConfigError::MissingField("llmApiKey"));
        }
        if self.tts_api_key.is_empty() {
            return Err(ConfigError::MissingField("ttsApiKey"));
        }
        if self.voice.silence_threshold_ms < 200 || self.voice.silence_threshold_ms > 5000 {
            return Err(ConfigError::InvalidValue {
                field: "silenceThresholdMs",
                message: format!(
                    "must be between 200 and 5000, got {}",
                    self.voice.silence_threshold_ms
                ),
            });
        }
        if let Some(max) = self.history_max {
            if max < 2 {
                return Err(ConfigError::InvalidValue {
                    field: "historyMax",
                    message: "must keep at least one turn per side".to_string(),
                });
            }
        }
        Ok(())
    }

    /// History cap, falling back to the default of 20 entries
    pub fn history_entries(&self) -> usize {
        self.history_max
            .unwrap_or(blitsum_core::ConversationLog::DEFAULT_MAX_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_embed_config() {
        let config =
            RuntimeConfig::from_json(r#"{"llmApiKey":"sk-test","ttsApiKey":"tts-test"}"#).unwrap();
        assert_eq!(config.voice.silence_threshold_ms, 800);
        assert_eq!(config.history_entries(), 20);
        assert!(config.tts_voice_id.is_none());
    }

    #[test]
    fn test_silence_threshold_override() {
        let config = RuntimeConfig::from_json(
            r#"{"llmApiKey":"k","ttsApiKey":"k","silenceThresholdMs":1200}"#,
        )
        .unwrap();
        assert_eq!(config.voice.silence_threshold_ms, 1200);
    }

    #[test]
    fn test_missing_key_rejected() {
        let err = RuntimeConfig::from_json(r#"{"ttsApiKey":"k"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_out_of_range_silence_rejected() {
        let err = RuntimeConfig::from_json(
            r#"{"llmApiKey":"k","ttsApiKey":"k","silenceThresholdMs":50}"#,
        );
        assert!(matches!(err, Err(ConfigError::InvalidValue { .. })));
    }
}
