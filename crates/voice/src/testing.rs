//! Scripted doubles for the session's host-provided pieces
//!
//! Used by the session tests here and by the runtime's integration tests.

use crate::error::VoiceError;
use crate::tts::TtsSpeaker;
use async_trait::async_trait;
use blitsum_core::{RecognitionEvent, SpeechRecognizer};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

/// Recognizer driven by the test: events pass through only while started
#[derive(Default)]
pub struct ScriptedRecognizer {
    tx: Mutex<Option<mpsc::Sender<RecognitionEvent>>>,
    active: AtomicBool,
    starts: AtomicU32,
}

impl ScriptedRecognizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Push an event as the host recognizer would. Returns whether it was
    /// delivered (false when stopped).
    pub async fn emit(&self, event: RecognitionEvent) -> bool {
        if !self.active.load(Ordering::SeqCst) {
            return false;
        }
        let tx = self.tx.lock().clone();
        match tx {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Emit even while stopped, modeling a recognizer whose stop has not
    /// yet taken effect (the barge-in window)
    pub async fn emit_forced(&self, event: RecognitionEvent) -> bool {
        let tx = self.tx.lock().clone();
        match tx {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    pub fn start_count(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn start(
        &self,
        events: mpsc::Sender<RecognitionEvent>,
    ) -> blitsum_core::Result<()> {
        *self.tx.lock() = Some(events);
        self.active.store(true, Ordering::SeqCst);
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

/// Speaker whose completion the test controls
pub struct ControlledSpeaker {
    spoken: Mutex<Vec<String>>,
    outcome: Mutex<Option<Result<(), VoiceError>>>,
    release: Notify,
    interrupted: AtomicBool,
}

impl ControlledSpeaker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            spoken: Mutex::new(Vec::new()),
            outcome: Mutex::new(None),
            release: Notify::new(),
            interrupted: AtomicBool::new(false),
        })
    }

    /// Let the pending speak resolve successfully
    pub fn finish(&self) {
        *self.outcome.lock() = Some(Ok(()));
        self.release.notify_waiters();
    }

    /// Fail the pending speak
    pub fn fail(&self, error: VoiceError) {
        *self.outcome.lock() = Some(Err(error));
        self.release.notify_waiters();
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }

    pub fn was_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TtsSpeaker for ControlledSpeaker {
    async fn connect(&self) -> Result<(), VoiceError> {
        Ok(())
    }

    async fn speak(&self, text: &str) -> Result<(), VoiceError> {
        self.spoken.lock().push(text.to_string());
        *self.outcome.lock() = None;
        loop {
            let wake = self.release.notified();
            tokio::pin!(wake);
            wake.as_mut().enable();

            if let Some(outcome) = self.outcome.lock().take() {
                return outcome;
            }
            wake.await;
        }
    }

    fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        *self.outcome.lock() = Some(Err(VoiceError::Interrupted));
        self.release.notify_waiters();
    }

    async fn disconnect(&self) {
        *self.outcome.lock() = Some(Err(VoiceError::Disconnected));
        self.release.notify_waiters();
    }
}

impl Default for ControlledSpeaker {
    fn default() -> Self {
        Self {
            spoken: Mutex::new(Vec::new()),
            outcome: Mutex::new(None),
            release: Notify::new(),
            interrupted: AtomicBool::new(false),
        }
    }
}
