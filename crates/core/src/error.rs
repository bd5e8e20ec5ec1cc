//! Shared error type for core traits

use thiserror::Error;

/// Errors surfaced by core trait implementations
#[derive(Debug, Error)]
pub enum Error {
    /// Speech recognition is not available on this host
    #[error("speech recognition unsupported: {0}")]
    RecognitionUnsupported(String),

    /// Transient recognition failure (no-speech, aborted)
    #[error("recognition transient: {0}")]
    RecognitionTransient(String),

    /// Microphone or storage permission denied by the host
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Key-value storage failure
    #[error("storage: {0}")]
    Storage(String),
}

impl Error {
    /// Transient errors are silently retried by the voice session
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::RecognitionTransient(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
