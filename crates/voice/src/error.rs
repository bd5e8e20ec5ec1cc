//! Voice pipeline errors

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VoiceError {
    /// A newer utterance cancelled this one
    #[error("Interrupted by new speech")]
    Interrupted,

    /// The TTS connection was lost and reconnects were exhausted
    #[error("Disconnected")]
    Disconnected,

    /// Server-reported TTS error frame
    #[error("tts protocol: {0}")]
    Protocol(String),

    /// The host has no speech recognition
    #[error("speech recognition unsupported: {0}")]
    RecognitionUnsupported(String),

    /// Microphone permission was refused
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Malformed audio payload
    #[error("audio decode: {0}")]
    Decode(String),
}
