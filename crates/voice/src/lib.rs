//! Voice runtime
//!
//! Full-duplex voice pipeline: browser-style speech recognition feeding
//! silence-based turn taking, and a remote TTS WebSocket stream played back
//! gaplessly with barge-in and joint completion tracking. A local synthesis
//! fallback implements the same speaker interface for hosts where the
//! remote TTS is unavailable.

pub mod audio;
pub mod error;
pub mod fallback;
pub mod playback;
pub mod protocol;
pub mod session;
pub mod testing;
pub mod tts;

pub use error::VoiceError;
pub use fallback::LocalSynthSpeaker;
pub use playback::PlaybackScheduler;
pub use session::{VoiceEvent, VoiceSession, VoiceSessionState};
pub use tts::{StreamingTtsClient, TtsSpeaker};
