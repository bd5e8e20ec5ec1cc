//! Inferred visitor profile

use crate::behavior::BehaviorSnapshot;
use serde::{Deserialize, Serialize};

/// Archetype of the visitor inferred from their messages and behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Buyer,
    Researcher,
    Skeptic,
    Explorer,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompanySize {
    Startup,
    Smb,
    Enterprise,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    High,
    Medium,
    Low,
    #[default]
    Unknown,
}

/// Coarse budget signal read from the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BudgetSignal {
    Low,
    Mid,
    High,
    #[default]
    Unknown,
}

/// Visitor profile built from the full conversation history plus behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_type: UserType,
    pub company_size: CompanySize,
    pub industry: Option<String>,
    pub urgency: Urgency,
    pub budget: BudgetSignal,
    /// Raw utterance samples mentioning a pain point, deduped
    pub pain_points: Vec<String>,
    /// Raw utterance samples expressing interest, deduped
    pub interests: Vec<String>,
    /// Raw utterance samples raising an objection, deduped
    pub objections: Vec<String>,
    pub behavior: BehaviorSnapshot,
    /// 0.0..=1.0, weighted sum of which attributes are known
    pub confidence: f32,
}

impl UserProfile {
    pub fn unknown(behavior: BehaviorSnapshot) -> Self {
        Self {
            user_type: UserType::Unknown,
            company_size: CompanySize::Unknown,
            industry: None,
            urgency: Urgency::Unknown,
            budget: BudgetSignal::Unknown,
            pain_points: Vec::new(),
            interests: Vec::new(),
            objections: Vec::new(),
            behavior,
            confidence: 0.0,
        }
    }

    /// Profiles below this confidence are left out of the system prompt
    pub fn is_confident(&self) -> bool {
        self.confidence >= 0.5
    }
}
