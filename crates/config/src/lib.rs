//! Runtime configuration, constants and keyword tables
//!
//! Everything the rest of the SDK treats as data lives here: the embed
//! config, timing constants, the intent/target vocabularies, the sales cue
//! tables, closing templates and the engagement trigger rule table (shipped
//! empty). Keeping the tables in one crate keeps word-boundary semantics in
//! one place and lets tests swap tables without touching code.

pub mod constants;
pub mod keywords;
pub mod sales;
pub mod settings;
pub mod triggers;

pub use sales::{BantCues, ClosingTemplate, ProfileCues, SpinBank};
pub use settings::{ConfigError, LlmSettings, RuntimeConfig, TtsSettings, VoiceSettings};
pub use triggers::{TriggerCondition, TriggerPriority, TriggerRule};
