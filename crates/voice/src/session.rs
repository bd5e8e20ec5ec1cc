//! Voice session
//!
//! Walkie-talkie state machine between the host recognizer and the TTS
//! speaker: continuous interim recognition with a silence timer for end of
//! turn, recognition stopped while the agent speaks, barge-in interrupting
//! playback immediately, and error states that recover back to listening.

use crate::error::VoiceError;
use crate::tts::TtsSpeaker;
use blitsum_config::constants::voice as voice_consts;
use blitsum_core::{RecognitionEvent, SpeechRecognizer};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceSessionState {
    Idle,
    Listening,
    UserSpeaking,
    Processing,
    AiSpeaking,
    Error,
}

/// Session events, consumed by the shell and by tests
#[derive(Debug, Clone)]
pub enum VoiceEvent {
    StateChanged {
        from: VoiceSessionState,
        to: VoiceSessionState,
    },
    /// Interim transcript
    Partial { transcript: String },
    /// A user turn is complete and ready for the conversation path
    TurnReady { transcript: String },
    BargeIn,
    Error { message: String },
}

struct PendingTurn {
    buffer: String,
    silence_timer: Option<JoinHandle<()>>,
}

/// State shared with the recognition consumer and timer tasks
struct SessionShared {
    speaker: Arc<dyn TtsSpeaker>,
    silence_threshold: Duration,
    state: Mutex<VoiceSessionState>,
    events: broadcast::Sender<VoiceEvent>,
    pending: Mutex<PendingTurn>,
}

impl SessionShared {
    fn state(&self) -> VoiceSessionState {
        *self.state.lock()
    }

    fn set_state(&self, to: VoiceSessionState) {
        let from = {
            let mut state = self.state.lock();
            let from = *state;
            *state = to;
            from
        };
        if from != to {
            let _ = self.events.send(VoiceEvent::StateChanged { from, to });
        }
    }

    /// A recognition result during AI speech interrupts the stream
    /// immediately and swings back to listening
    fn handle_barge_in(&self) {
        if self.state() == VoiceSessionState::AiSpeaking {
            self.speaker.interrupt();
            self.set_state(VoiceSessionState::Listening);
            let _ = self.events.send(VoiceEvent::BargeIn);
        }
    }

    fn cancel_silence_timer(&self) {
        if let Some(timer) = self.pending.lock().silence_timer.take() {
            timer.abort();
        }
    }

    fn finish_turn(&self) {
        let transcript = {
            let mut pending = self.pending.lock();
            pending.silence_timer = None;
            std::mem::take(&mut pending.buffer)
        };
        if transcript.is_empty() {
            return;
        }
        self.set_state(VoiceSessionState::Processing);
        let _ = self.events.send(VoiceEvent::TurnReady { transcript });
    }
}

/// Arm (or re-arm) the end-of-turn silence timer
fn arm_silence_timer(shared: &Arc<SessionShared>) {
    let timer_shared = Arc::clone(shared);
    let threshold = shared.silence_threshold;
    let timer = tokio::spawn(async move {
        tokio::time::sleep(threshold).await;
        timer_shared.finish_turn();
    });
    let mut pending = shared.pending.lock();
    if let Some(prior) = pending.silence_timer.replace(timer) {
        prior.abort();
    }
}

async fn consume_events(shared: Arc<SessionShared>, mut rx: mpsc::Receiver<RecognitionEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            RecognitionEvent::Partial { transcript } => {
                shared.handle_barge_in();
                if shared.state() == VoiceSessionState::Listening {
                    shared.set_state(VoiceSessionState::UserSpeaking);
                }
                // partials reset any pending end-of-turn timer
                shared.cancel_silence_timer();
                let _ = shared.events.send(VoiceEvent::Partial { transcript });
            }
            RecognitionEvent::Final { transcript } => {
                shared.handle_barge_in();
                if shared.state() == VoiceSessionState::Listening {
                    shared.set_state(VoiceSessionState::UserSpeaking);
                }
                {
                    let mut pending = shared.pending.lock();
                    if !pending.buffer.is_empty() {
                        pending.buffer.push(' ');
                    }
                    pending.buffer.push_str(transcript.trim());
                }
                arm_silence_timer(&shared);
            }
            RecognitionEvent::Transient { reason } => {
                // no-speech and friends: stay in listening, keep going
                tracing::debug!(reason, "transient recognition event");
            }
            RecognitionEvent::Stopped => {}
        }
    }
}

/// One voice-mode session; created on entering voice mode and destroyed on
/// exit, releasing the recognizer (and with it the microphone)
pub struct VoiceSession {
    recognizer: Arc<dyn SpeechRecognizer>,
    shared: Arc<SessionShared>,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl VoiceSession {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        speaker: Arc<dyn TtsSpeaker>,
        silence_threshold: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            recognizer,
            shared: Arc::new(SessionShared {
                speaker,
                silence_threshold,
                state: Mutex::new(VoiceSessionState::Idle),
                events,
                pending: Mutex::new(PendingTurn {
                    buffer: String::new(),
                    silence_timer: None,
                }),
            }),
            consumer: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<VoiceEvent> {
        self.shared.events.subscribe()
    }

    pub fn state(&self) -> VoiceSessionState {
        self.shared.state()
    }

    /// Start the session: connect the speaker, start recognition, and spawn
    /// the recognition event consumer
    pub async fn start(&self) -> Result<(), VoiceError> {
        self.shared.speaker.connect().await?;
        self.start_recognition().await.map_err(map_recognition_error)?;
        self.shared.set_state(VoiceSessionState::Listening);
        Ok(())
    }

    async fn start_recognition(&self) -> blitsum_core::Result<()> {
        let (tx, rx) = mpsc::channel(64);
        self.recognizer.start(tx).await?;
        let shared = Arc::clone(&self.shared);
        let consumer = tokio::spawn(async move {
            consume_events(shared, rx).await;
        });
        if let Some(prior) = self.consumer.lock().replace(consumer) {
            prior.abort();
        }
        Ok(())
    }

    /// Speak the assistant reply with walkie-talkie discipline: recognition
    /// stops during playback and restarts shortly after completion
    pub async fn speak_response(&self, text: &str) -> Result<(), VoiceError> {
        self.recognizer.stop().await;
        self.shared.set_state(VoiceSessionState::AiSpeaking);

        match self.shared.speaker.speak(text).await {
            Ok(()) => {
                tokio::time::sleep(voice_consts::RECOGNIZER_RESTART_DELAY).await;
                self.restart_recognition().await;
                self.shared.set_state(VoiceSessionState::Listening);
                Ok(())
            }
            Err(VoiceError::Interrupted) => {
                // barge-in: recognition continues, no restart delay
                if !self.recognizer.is_active() {
                    self.restart_recognition().await;
                }
                self.shared.set_state(VoiceSessionState::Listening);
                Err(VoiceError::Interrupted)
            }
            Err(error) => {
                let _ = self.shared.events.send(VoiceEvent::Error {
                    message: error.to_string(),
                });
                self.shared.set_state(VoiceSessionState::Error);
                tokio::time::sleep(voice_consts::ERROR_RECOVERY_DELAY).await;
                self.restart_recognition().await;
                self.shared.set_state(VoiceSessionState::Listening);
                Err(error)
            }
        }
    }

    async fn restart_recognition(&self) {
        if let Err(e) = self.start_recognition().await {
            tracing::warn!("recognizer restart failed: {e}");
        }
    }

    /// Destroy the session: stop recognition (releasing the microphone),
    /// tear the speaker down and cancel timers
    pub async fn stop(&self) {
        self.shared.cancel_silence_timer();
        self.recognizer.stop().await;
        self.shared.speaker.disconnect().await;
        if let Some(consumer) = self.consumer.lock().take() {
            consumer.abort();
        }
        self.shared.pending.lock().buffer.clear();
        self.shared.set_state(VoiceSessionState::Idle);
    }

    /// Human-readable status line for the shell indicator
    pub fn status_line(&self) -> &'static str {
        match self.state() {
            VoiceSessionState::Idle => "",
            VoiceSessionState::Listening => "Listening…",
            VoiceSessionState::UserSpeaking => "You're speaking…",
            VoiceSessionState::Processing => "Processing…",
            VoiceSessionState::AiSpeaking => "AI is speaking…",
            VoiceSessionState::Error => "Something went wrong…",
        }
    }
}

fn map_recognition_error(error: blitsum_core::Error) -> VoiceError {
    match error {
        blitsum_core::Error::RecognitionUnsupported(msg) => {
            VoiceError::RecognitionUnsupported(msg)
        }
        blitsum_core::Error::PermissionDenied(msg) => VoiceError::PermissionDenied(msg),
        other => VoiceError::Protocol(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ControlledSpeaker, ScriptedRecognizer};

    fn partial(t: &str) -> RecognitionEvent {
        RecognitionEvent::Partial {
            transcript: t.to_string(),
        }
    }

    fn final_seg(t: &str) -> RecognitionEvent {
        RecognitionEvent::Final {
            transcript: t.to_string(),
        }
    }

    async fn setup() -> (
        Arc<ScriptedRecognizer>,
        Arc<ControlledSpeaker>,
        Arc<VoiceSession>,
    ) {
        let recognizer = ScriptedRecognizer::new();
        let speaker = ControlledSpeaker::new();
        let session = Arc::new(VoiceSession::new(
            recognizer.clone(),
            speaker.clone(),
            Duration::from_millis(800),
        ));
        session.start().await.unwrap();
        (recognizer, speaker, session)
    }

    #[tokio::test(start_paused = true)]
    async fn test_turn_fires_after_silence() {
        let (recognizer, _speaker, session) = setup().await;
        let mut events = session.subscribe();

        recognizer.emit(final_seg("show me pricing")).await;
        tokio::task::yield_now().await;
        assert_eq!(session.state(), VoiceSessionState::UserSpeaking);

        tokio::time::advance(Duration::from_millis(850)).await;
        tokio::task::yield_now().await;
        assert_eq!(session.state(), VoiceSessionState::Processing);

        let turn = loop {
            match events.recv().await.unwrap() {
                VoiceEvent::TurnReady { transcript } => break transcript,
                _ => continue,
            }
        };
        assert_eq!(turn, "show me pricing");
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_resets_silence_timer() {
        let (recognizer, _speaker, session) = setup().await;

        recognizer.emit(final_seg("I want")).await;
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(500)).await;

        // a partial arrives before the timer fires: the turn must not end
        recognizer.emit(partial("I want to")).await;
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(500)).await;
        tokio::task::yield_now().await;
        assert_ne!(session.state(), VoiceSessionState::Processing);

        // the final segment re-arms the timer; silence completes the turn
        recognizer.emit(final_seg("to see pricing")).await;
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(850)).await;
        tokio::task::yield_now().await;
        assert_eq!(session.state(), VoiceSessionState::Processing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_walkie_talkie_stops_recognizer() {
        let (recognizer, speaker, session) = setup().await;

        let speak = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.speak_response("Our Pro plan is $199.").await })
        };
        tokio::task::yield_now().await;
        assert_eq!(session.state(), VoiceSessionState::AiSpeaking);
        assert!(!recognizer.is_active());

        speaker.finish();
        let result = speak.await.unwrap();
        assert!(result.is_ok());
        assert_eq!(session.state(), VoiceSessionState::Listening);
        // restarted after playback: started twice in total
        assert_eq!(recognizer.start_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_barge_in_interrupts_and_rejects() {
        let (recognizer, speaker, session) = setup().await;
        let mut events = session.subscribe();

        let speak = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.speak_response("a long spoken reply").await })
        };
        tokio::task::yield_now().await;
        assert_eq!(session.state(), VoiceSessionState::AiSpeaking);

        // the recognizer produces a result during ai speech
        recognizer.emit_forced(partial("wait actually")).await;
        tokio::task::yield_now().await;

        assert!(speaker.was_interrupted());
        assert_ne!(session.state(), VoiceSessionState::AiSpeaking);
        let result = speak.await.unwrap();
        assert_eq!(result, Err(VoiceError::Interrupted));
        assert_eq!(session.state(), VoiceSessionState::Listening);

        let saw_barge_in = loop {
            match events.try_recv() {
                Ok(VoiceEvent::BargeIn) => break true,
                Ok(_) => continue,
                Err(_) => break false,
            }
        };
        assert!(saw_barge_in);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_recovers_to_listening() {
        let (_recognizer, speaker, session) = setup().await;

        let speak = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.speak_response("hello").await })
        };
        tokio::task::yield_now().await;
        speaker.fail(VoiceError::Protocol("voice not found".to_string()));

        // error state first, then recovery after the delay
        tokio::task::yield_now().await;
        assert_eq!(session.state(), VoiceSessionState::Error);

        tokio::time::advance(voice_consts::ERROR_RECOVERY_DELAY + Duration::from_millis(50)).await;
        let result = speak.await.unwrap();
        assert!(result.is_err());
        assert_eq!(session.state(), VoiceSessionState::Listening);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_keep_listening() {
        let (recognizer, _speaker, session) = setup().await;

        for _ in 0..10 {
            recognizer
                .emit(RecognitionEvent::Transient {
                    reason: "no-speech".to_string(),
                })
                .await;
            tokio::task::yield_now().await;
            tokio::time::advance(Duration::from_secs(3)).await;
        }
        // 30 seconds of no-speech: still listening, no turn fired
        assert_eq!(session.state(), VoiceSessionState::Listening);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_releases_everything() {
        let (recognizer, _speaker, session) = setup().await;
        session.stop().await;
        assert_eq!(session.state(), VoiceSessionState::Idle);
        assert!(!recognizer.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_lines() {
        let (_recognizer, _speaker, session) = setup().await;
        assert_eq!(session.status_line(), "Listening…");
    }
}
