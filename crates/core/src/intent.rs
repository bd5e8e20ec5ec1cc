//! Parsed intent types produced by the intent parser

use serde::{Deserialize, Serialize};

/// What the visitor wants the agent to do on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Navigate,
    Compare,
    Highlight,
    Read,
    Click,
    #[default]
    Unknown,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Navigate => "navigate",
            IntentKind::Compare => "compare",
            IntentKind::Highlight => "highlight",
            IntentKind::Read => "read",
            IntentKind::Click => "click",
            IntentKind::Unknown => "unknown",
        }
    }
}

/// What part of the page the intent refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IntentTarget {
    Pricing,
    Features,
    Signup,
    Contact,
    About,
    Faq,
    Product,
    Cta,
    #[default]
    Unknown,
}

impl IntentTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentTarget::Pricing => "pricing",
            IntentTarget::Features => "features",
            IntentTarget::Signup => "signup",
            IntentTarget::Contact => "contact",
            IntentTarget::About => "about",
            IntentTarget::Faq => "faq",
            IntentTarget::Product => "product",
            IntentTarget::Cta => "cta",
            IntentTarget::Unknown => "unknown",
        }
    }
}

/// Normalized user utterance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedIntent {
    pub intent: IntentKind,
    pub target: IntentTarget,
    /// Plan/product/feature names recognized in the utterance
    pub entities: Vec<String>,
    /// 0.0..=1.0
    pub confidence: f32,
}

impl ParsedIntent {
    /// Whether this utterance should be routed to the navigation agent
    /// instead of the conversational path
    pub fn is_navigation_request(&self) -> bool {
        self.confidence >= 0.5 && self.intent != IntentKind::Unknown
    }
}
