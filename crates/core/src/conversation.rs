//! Conversation types: turns, stages and the capped history log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role in a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// A single turn in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }
}

/// Sales conversation stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStage {
    /// Initial greeting and rapport building
    #[default]
    Greeting,
    /// Understanding visitor needs
    Discovery,
    /// Assessing budget, authority, need and timeline
    Qualification,
    /// Presenting product and benefits
    Presentation,
    /// Handling concerns and objections
    Objection,
    /// Moving towards commitment
    Closing,
    /// Deal done or conversation wrapped up
    Completed,
}

impl ConversationStage {
    pub fn display_name(&self) -> &'static str {
        match self {
            ConversationStage::Greeting => "Greeting",
            ConversationStage::Discovery => "Discovery",
            ConversationStage::Qualification => "Qualification",
            ConversationStage::Presentation => "Presentation",
            ConversationStage::Objection => "Objection Handling",
            ConversationStage::Closing => "Closing",
            ConversationStage::Completed => "Completed",
        }
    }

    /// Stages the flow never auto-advances out of on keyword silence
    pub fn is_sticky(&self) -> bool {
        matches!(self, ConversationStage::Objection | ConversationStage::Closing)
    }

    /// Default progression by user message count, used when no cue matched
    pub fn default_for_message_count(count: usize) -> Self {
        match count {
            0 => ConversationStage::Greeting,
            1 => ConversationStage::Discovery,
            2 => ConversationStage::Qualification,
            _ => ConversationStage::Presentation,
        }
    }
}

impl std::fmt::Display for ConversationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Audit record of a stage change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTransition {
    pub from: ConversationStage,
    pub to: ConversationStage,
    /// The cue phrase or rule that triggered the change
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Ordered conversation history, capped to the most recent entries.
///
/// The cap covers user and assistant entries together; the default of 20
/// keeps the last 10 turns of each side.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    turns: Vec<Turn>,
    max_entries: usize,
}

impl ConversationLog {
    pub const DEFAULT_MAX_ENTRIES: usize = 20;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_entries: max_entries.max(2),
        }
    }

    /// Append a turn, evicting the oldest entries past the cap
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
        if self.turns.len() > self.max_entries {
            let excess = self.turns.len() - self.max_entries;
            self.turns.drain(0..excess);
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of user messages in the retained window
    pub fn user_message_count(&self) -> usize {
        self.turns.iter().filter(|t| t.role == TurnRole::User).count()
    }

    /// All user message contents, oldest first
    pub fn user_messages(&self) -> Vec<&str> {
        self.turns
            .iter()
            .filter(|t| t.role == TurnRole::User)
            .map(|t| t.content.as_str())
            .collect()
    }

    pub fn last_user_message(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == TurnRole::User)
            .map(|t| t.content.as_str())
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}
