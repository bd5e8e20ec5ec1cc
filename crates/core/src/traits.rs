//! Core traits for pluggable host services
//!
//! The runtime is embedded in arbitrary hosts; the pieces it cannot own
//! (microphone speech recognition, durable key-value storage) are expressed
//! as traits the embedder provides. Tests use scripted implementations.

use crate::error::Result;
use async_trait::async_trait;

/// An event emitted by a speech recognizer.
///
/// Recognizers run in continuous, interim-results mode: partial transcripts
/// stream in while the user speaks, followed by a final segment per phrase.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionEvent {
    /// Interim transcript; supersedes prior partials for this phrase
    Partial { transcript: String },
    /// Final transcript for one phrase
    Final { transcript: String },
    /// Transient recognizer error (`no-speech`, `aborted`); recognition
    /// continues or is restarted by the session
    Transient { reason: String },
    /// The recognizer stopped and will not restart on its own
    Stopped,
}

/// Continuous speech recognition as provided by the host.
///
/// Implementations deliver events through the channel handed to `start`.
/// `stop` must be idempotent and release the microphone.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Begin continuous recognition, delivering events to `events`.
    /// Fails with `RecognitionUnsupported` when the host has no recognizer
    /// and `PermissionDenied` when microphone access is refused.
    async fn start(&self, events: tokio::sync::mpsc::Sender<RecognitionEvent>) -> Result<()>;

    /// Stop recognition and release the microphone. Idempotent.
    async fn stop(&self);

    /// Whether recognition is currently running
    fn is_active(&self) -> bool;
}

/// Minimal durable string storage (the host's local storage).
///
/// The runtime persists exactly one flag through this interface.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str);
}

/// In-memory store used in tests and hosts without durable storage
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if let Ok(mut map) = self.entries.lock() {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.entries.lock() {
            map.remove(key);
        }
    }
}
