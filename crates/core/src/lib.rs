//! Core types and traits for the Blitsum sales agent runtime
//!
//! This crate provides foundational types used across all other crates:
//! - The page context model (pricing, features, FAQs, products, CTAs)
//! - Conversation types (turns, stages, capped history)
//! - Behavior snapshot mutated by the tracker and read everywhere else
//! - Intent, action and directive types
//! - Core traits for pluggable host services (speech recognition, storage)
//! - Error types

pub mod actions;
pub mod behavior;
pub mod context;
pub mod conversation;
pub mod error;
pub mod intent;
pub mod profile;
pub mod text;
pub mod traits;

pub use actions::{ActionKind, ActionOutcome, Directive, PlannedAction};
pub use behavior::BehaviorSnapshot;
pub use context::{
    CallToAction, CurrentSection, Faq, Feature, HeadingInfo, LinkInfo, NodeId, PageContent,
    PageContext, PageMetadata, PricePeriod, PricingPlan, Product, SectionInfo,
};
pub use conversation::{ConversationLog, ConversationStage, StageTransition, Turn, TurnRole};
pub use error::{Error, Result};
pub use intent::{IntentKind, IntentTarget, ParsedIntent};
pub use profile::{BudgetSignal, CompanySize, Urgency, UserProfile, UserType};
pub use traits::{KeyValueStore, MemoryStore, RecognitionEvent, SpeechRecognizer};
