//! Streaming TTS client
//!
//! WebSocket client for the remote TTS vendor. Each utterance gets a fresh
//! context id; the client sends the voice config and the text with an end
//! marker, then resolves the speak future only when BOTH completion
//! signals hold: the server's final-audio frame has arrived and every
//! scheduled playback source has finished. Interrupts reject the pending
//! future and flush playback; disconnects reconnect up to three times
//! before rejecting terminally.

use crate::audio::StreamDecoder;
use crate::error::VoiceError;
use crate::playback::PlaybackScheduler;
use crate::protocol::{self, ClientMessage, ServerMessage, VoiceConfig};
use async_trait::async_trait;
use blitsum_config::constants::voice as voice_consts;
use blitsum_config::TtsSettings;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;

/// The speaker surface shared by the remote client and the local fallback
#[async_trait]
pub trait TtsSpeaker: Send + Sync {
    /// Establish the transport. Idempotent.
    async fn connect(&self) -> Result<(), VoiceError>;

    /// Speak one utterance. Resolves when playback fully completes;
    /// rejects with `Interrupted` on barge-in or a newer utterance, and
    /// with `Disconnected` on terminal transport loss.
    async fn speak(&self, text: &str) -> Result<(), VoiceError>;

    /// Cancel current playback. Idempotent, safe in any state.
    fn interrupt(&self);

    /// Tear the transport down and reject anything pending.
    async fn disconnect(&self);
}

/// One in-flight utterance
struct Utterance {
    context_id: String,
    received_final: AtomicBool,
    verdict: Mutex<Option<VoiceError>>,
    notify: Notify,
}

impl Utterance {
    fn new(context_id: String) -> Arc<Self> {
        Arc::new(Self {
            context_id,
            received_final: AtomicBool::new(false),
            verdict: Mutex::new(None),
            notify: Notify::new(),
        })
    }

    fn reject(&self, error: VoiceError) {
        let mut verdict = self.verdict.lock();
        if verdict.is_none() {
            *verdict = Some(error);
        }
        drop(verdict);
        self.notify.notify_waiters();
    }
}

struct Connection {
    outgoing: mpsc::Sender<ClientMessage>,
    task: JoinHandle<()>,
}

/// Remote TTS over WebSocket with gapless playback
pub struct StreamingTtsClient {
    settings: TtsSettings,
    api_key: String,
    voice_id: String,
    playback: Arc<PlaybackScheduler>,
    decoder: Arc<Mutex<StreamDecoder>>,
    current: Arc<Mutex<Option<Arc<Utterance>>>>,
    connection: Mutex<Option<Connection>>,
}

impl StreamingTtsClient {
    pub fn new(
        settings: TtsSettings,
        api_key: impl Into<String>,
        voice_id: impl Into<String>,
        playback: Arc<PlaybackScheduler>,
    ) -> Self {
        Self {
            settings,
            api_key: api_key.into(),
            voice_id: voice_id.into(),
            playback,
            decoder: Arc::new(Mutex::new(StreamDecoder::new())),
            current: Arc::new(Mutex::new(None)),
            connection: Mutex::new(None),
        }
    }

    /// Spawn the connection task: connects, pumps outgoing messages, and
    /// routes server frames. Reconnects with bounded retries; terminal
    /// loss rejects the pending utterance with `Disconnected`.
    fn spawn_connection(&self) -> Result<(), VoiceError> {
        let url = protocol::stream_url(&self.settings, &self.api_key)
            .map_err(|e| VoiceError::Protocol(format!("bad endpoint: {e}")))?;

        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<ClientMessage>(32);
        let playback = Arc::clone(&self.playback);
        let decoder = Arc::clone(&self.decoder);
        let current = Arc::clone(&self.current);

        let task = tokio::spawn(async move {
            let mut attempts: u32 = 0;
            'reconnect: loop {
                let ws = match tokio_tungstenite::connect_async(url.as_str()).await {
                    Ok((ws, _response)) => ws,
                    Err(e) => {
                        attempts += 1;
                        tracing::warn!(attempt = attempts, "tts connect failed: {e}");
                        if attempts >= voice_consts::MAX_RECONNECT_ATTEMPTS {
                            reject_current(&current, VoiceError::Disconnected);
                            return;
                        }
                        tokio::time::sleep(voice_consts::RECONNECT_DELAY).await;
                        continue;
                    }
                };
                attempts = 0;
                let (mut sink, mut stream) = ws.split();

                loop {
                    tokio::select! {
                        outgoing = outgoing_rx.recv() => {
                            let Some(message) = outgoing else {
                                // client dropped: close politely and stop
                                let _ = sink.close().await;
                                return;
                            };
                            let json = match serde_json::to_string(&message) {
                                Ok(json) => json,
                                Err(e) => {
                                    tracing::error!("unserializable tts message: {e}");
                                    continue;
                                }
                            };
                            if sink.send(WsMessage::text(json)).await.is_err() {
                                attempts += 1;
                                if attempts >= voice_consts::MAX_RECONNECT_ATTEMPTS {
                                    reject_current(&current, VoiceError::Disconnected);
                                    return;
                                }
                                tokio::time::sleep(voice_consts::RECONNECT_DELAY).await;
                                continue 'reconnect;
                            }
                        }
                        incoming = stream.next() => {
                            match incoming {
                                Some(Ok(WsMessage::Text(raw))) => {
                                    handle_server_frame(raw.as_str(), &playback, &decoder, &current);
                                }
                                Some(Ok(WsMessage::Close(_))) | None => {
                                    attempts += 1;
                                    tracing::warn!(attempt = attempts, "tts stream closed");
                                    if attempts >= voice_consts::MAX_RECONNECT_ATTEMPTS {
                                        reject_current(&current, VoiceError::Disconnected);
                                        return;
                                    }
                                    tokio::time::sleep(voice_consts::RECONNECT_DELAY).await;
                                    continue 'reconnect;
                                }
                                Some(Ok(_)) => {}
                                Some(Err(e)) => {
                                    attempts += 1;
                                    tracing::warn!(attempt = attempts, "tts stream error: {e}");
                                    if attempts >= voice_consts::MAX_RECONNECT_ATTEMPTS {
                                        reject_current(&current, VoiceError::Disconnected);
                                        return;
                                    }
                                    tokio::time::sleep(voice_consts::RECONNECT_DELAY).await;
                                    continue 'reconnect;
                                }
                            }
                        }
                    }
                }
            }
        });

        *self.connection.lock() = Some(Connection {
            outgoing: outgoing_tx,
            task,
        });
        Ok(())
    }

    async fn send(&self, message: ClientMessage) -> Result<(), VoiceError> {
        let outgoing = {
            let connection = self.connection.lock();
            connection
                .as_ref()
                .map(|c| c.outgoing.clone())
                .ok_or(VoiceError::Disconnected)?
        };
        outgoing
            .send(message)
            .await
            .map_err(|_| VoiceError::Disconnected)
    }

    /// Cancel the prior utterance on the wire and locally
    fn cancel_current(&self, error: VoiceError) -> Option<String> {
        let prior = self.current.lock().take()?;
        prior.reject(error);
        self.playback.flush();
        self.decoder.lock().reset();
        Some(prior.context_id.clone())
    }
}

fn reject_current(current: &Mutex<Option<Arc<Utterance>>>, error: VoiceError) {
    if let Some(utterance) = current.lock().take() {
        utterance.reject(error);
    }
}

fn handle_server_frame(
    raw: &str,
    playback: &Arc<PlaybackScheduler>,
    decoder: &Arc<Mutex<StreamDecoder>>,
    current: &Arc<Mutex<Option<Arc<Utterance>>>>,
) {
    let frame: ServerMessage = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!("unparseable tts frame ignored: {e}");
            return;
        }
    };

    if let Some(error) = frame.error {
        tracing::warn!(error, "tts server error");
        if let Some(utterance) = current.lock().take() {
            utterance.reject(VoiceError::Protocol(error));
        }
        playback.flush();
        return;
    }

    if let Some(ref chunk) = frame.audio {
        match decoder.lock().decode_chunk(&chunk) {
            Ok(samples) => {
                playback.schedule(samples);
            }
            Err(e) => tracing::warn!("dropping undecodable audio chunk: {e}"),
        }
    }

    if frame.is_final() {
        let guard = current.lock();
        if let Some(utterance) = guard.as_ref() {
            utterance.received_final.store(true, Ordering::SeqCst);
            utterance.notify.notify_waiters();
        }
    }
}

#[async_trait]
impl TtsSpeaker for StreamingTtsClient {
    async fn connect(&self) -> Result<(), VoiceError> {
        {
            let connection = self.connection.lock();
            if connection.as_ref().map(|c| !c.task.is_finished()).unwrap_or(false) {
                return Ok(());
            }
        }
        self.spawn_connection()
    }

    async fn speak(&self, text: &str) -> Result<(), VoiceError> {
        self.connect().await?;

        // a new call strictly serializes utterances: the prior pending
        // promise rejects, active sources flush, and the prior context is
        // ended on the wire before the new one starts
        if let Some(prior_context) = self.cancel_current(VoiceError::Interrupted) {
            self.send(ClientMessage::end_context(prior_context)).await?;
        }

        let context_id = format!("ctx-{}", uuid::Uuid::new_v4());
        let utterance = Utterance::new(context_id.clone());
        *self.current.lock() = Some(Arc::clone(&utterance));
        self.decoder.lock().reset();

        let config = VoiceConfig::new(self.voice_id.clone(), &self.settings);
        self.send(ClientMessage::config(config, context_id.clone())).await?;
        self.send(ClientMessage::text(text, context_id)).await?;

        let changes = self.playback.changes();
        loop {
            let utterance_wake = utterance.notify.notified();
            let playback_wake = changes.notified();
            tokio::pin!(utterance_wake, playback_wake);
            // register interest before checking, so a wake between the
            // check and the await cannot be lost
            utterance_wake.as_mut().enable();
            playback_wake.as_mut().enable();

            if let Some(error) = utterance.verdict.lock().clone() {
                return Err(error);
            }
            if utterance.received_final.load(Ordering::SeqCst)
                && self.playback.active_sources() == 0
            {
                // completed: clear the slot if it is still ours
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

            tokio::select! {
                _ = &mut utterance_wake => {}
                _ = &mut playback_wake => {}
            }
        }
    }

    fn interrupt(&self) {
        if let Some(prior_context) = self.cancel_current(VoiceError::Interrupted) {
            // best effort: barge into the current turn on the wire
            let outgoing = self.connection.lock().as_ref().map(|c| c.outgoing.clone());
            if let Some(outgoing) = outgoing {
                let _ = outgoing.try_send(ClientMessage::clear(prior_context));
            }
        }
    }

    async fn disconnect(&self) {
        self.cancel_current(VoiceError::Disconnected);
        if let Some(connection) = self.connection.lock().take() {
            connection.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The joint completion predicate and interrupt semantics, exercised
    /// against the shared utterance state the reader task drives
    #[tokio::test(start_paused = true)]
    async fn test_frame_routing_final_flag() {
        let playback = PlaybackScheduler::new(44_100);
        let decoder = Arc::new(Mutex::new(StreamDecoder::new()));
        let current = Arc::new(Mutex::new(Some(Utterance::new("ctx-1".to_string()))));

        handle_server_frame(r#"{"isFinalAudio":true}"#, &playback, &decoder, &current);
        let guard = current.lock();
        assert!(guard
            .as_ref()
            .unwrap()
            .received_final
            .load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_frame_rejects_current() {
        let playback = PlaybackScheduler::new(44_100);
        let decoder = Arc::new(Mutex::new(StreamDecoder::new()));
        let utterance = Utterance::new("ctx-1".to_string());
        let current = Arc::new(Mutex::new(Some(Arc::clone(&utterance))));

        handle_server_frame(r#"{"error":"voice missing"}"#, &playback, &decoder, &current);
        assert_eq!(
            utterance.verdict.lock().clone(),
            Some(VoiceError::Protocol("voice missing".to_string()))
        );
        assert!(current.lock().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_audio_frames_feed_playback() {
        use base64::Engine;
        let playback = PlaybackScheduler::new(44_100);
        let decoder = Arc::new(Mutex::new(StreamDecoder::new()));
        let current = Arc::new(Mutex::new(Some(Utterance::new("ctx-1".to_string()))));

        let pcm: Vec<u8> = vec![0u8; 8820]; // 100ms of 16-bit mono audio
        let b64 = base64::engine::general_purpose::STANDARD.encode(&pcm);
        let frame = format!(r#"{{"audio":"{b64}"}}"#);
        handle_server_frame(&frame, &playback, &decoder, &current);
        assert_eq!(playback.active_sources(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reject_is_sticky_first_error_wins() {
        let utterance = Utterance::new("ctx".to_string());
        utterance.reject(VoiceError::Interrupted);
        utterance.reject(VoiceError::Disconnected);
        assert_eq!(utterance.verdict.lock().clone(), Some(VoiceError::Interrupted));
    }
}
