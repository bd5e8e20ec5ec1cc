//! Local synthesis fallback
//!
//! Used when the remote TTS is unavailable or the host is offline. Speaks
//! through the host's own synthesis engine, so no audio flows through the
//! playback scheduler; the speak future resolves when the engine reports
//! completion, which this implementation models from the text length.

use crate::error::VoiceError;
use crate::tts::TtsSpeaker;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Rough speaking pace used to model utterance duration
const MS_PER_CHAR: u64 = 60;

struct ActiveUtterance {
    cancelled: Mutex<Option<VoiceError>>,
    notify: Notify,
}

/// Host-synthesis speaker with the same surface as the remote client
pub struct LocalSynthSpeaker {
    current: Mutex<Option<Arc<ActiveUtterance>>>,
}

impl LocalSynthSpeaker {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
        }
    }
}

impl Default for LocalSynthSpeaker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TtsSpeaker for LocalSynthSpeaker {
    async fn connect(&self) -> Result<(), VoiceError> {
        Ok(())
    }

    async fn speak(&self, text: &str) -> Result<(), VoiceError> {
        // a newer utterance cancels the prior one, same as the remote path
        if let Some(prior) = self.current.lock().take() {
            let mut cancelled = prior.cancelled.lock();
            if cancelled.is_none() {
                *cancelled = Some(VoiceError::Interrupted);
            }
            drop(cancelled);
            prior.notify.notify_waiters();
        }

        let utterance = Arc::new(ActiveUtterance {
            cancelled: Mutex::new(None),
            notify: Notify::new(),
        });
        *self.current.lock() = Some(Arc::clone(&utterance));

        let duration = Duration::from_millis(text.len() as u64 * MS_PER_CHAR);
        let finished = tokio::time::sleep(duration);
        tokio::pin!(finished);

        loop {
            let wake = utterance.notify.notified();
            tokio::pin!(wake);
            wake.as_mut().enable();

            if let Some(error) = utterance.cancelled.lock().clone() {
                return Err(error);
            }

            tokio::select! {
                _ = &mut finished => {
                    let mut current = self.current.lock();
                    if current
                        .as_ref()
                        .map(|u| Arc::ptr_eq(u, &utterance))
                        .unwrap_or(false)
                    {
                        *current = None;
                    }
                    return Ok(());
                }
                _ = &mut wake => {}
            }
        }
    }

    fn interrupt(&self) {
        if let Some(utterance) = self.current.lock().take() {
            let mut cancelled = utterance.cancelled.lock();
            if cancelled.is_none() {
                *cancelled = Some(VoiceError::Interrupted);
            }
            drop(cancelled);
            utterance.notify.notify_waiters();
        }
    }

    async fn disconnect(&self) {
        self.interrupt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_speak_resolves_after_duration() {
        let speaker = LocalSynthSpeaker::new();
        let result = speaker.speak("hello").await;
        assert!(result.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_rejects_pending() {
        let speaker = Arc::new(LocalSynthSpeaker::new());
        let speaking = {
            let speaker = Arc::clone(&speaker);
            tokio::spawn(async move { speaker.speak("a fairly long sentence to speak").await })
        };
        tokio::time::advance(Duration::from_millis(100)).await;
        tokio::task::yield_now().await;

        speaker.interrupt();
        let result = speaking.await.unwrap();
        assert_eq!(result, Err(VoiceError::Interrupted));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_idempotent_when_idle() {
        let speaker = LocalSynthSpeaker::new();
        speaker.interrupt();
        speaker.interrupt();
        assert!(speaker.speak("ok").await.is_ok());
    }
}
