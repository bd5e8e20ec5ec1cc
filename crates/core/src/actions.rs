//! Planned page actions and assistant-emitted directives

use crate::intent::IntentTarget;
use serde::{Deserialize, Serialize};

/// The kind of page action the executor can perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Navigate,
    Compare,
    Highlight,
    Read,
    Click,
    Focus,
    PulseCta,
}

/// One step of an ordered action plan, executed strictly left-to-right
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedAction {
    pub kind: ActionKind,
    /// Section-level target, when the step addresses a whole section
    pub target: Option<IntentTarget>,
    /// Named entities the step addresses (plans, features, products)
    pub entities: Vec<String>,
}

impl PlannedAction {
    pub fn navigate(target: IntentTarget) -> Self {
        Self {
            kind: ActionKind::Navigate,
            target: Some(target),
            entities: Vec::new(),
        }
    }

    pub fn with_entities(mut self, entities: Vec<String>) -> Self {
        self.entities = entities;
        self
    }
}

/// Result of executing one planned action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub error: Option<String>,
    /// Whether the addressed element ended up visible in the viewport
    pub is_visible: bool,
    /// Cleaned text content for read actions
    pub content: Option<String>,
}

impl ActionOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            is_visible: true,
            content: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            is_visible: false,
            content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Action directive embedded in assistant output.
///
/// The assistant emits at most one JSON object per line; lines that parse to
/// one of these variants are dispatched to the action executor, everything
/// else is prose. Unknown `action` tags are logged and ignored at the parse
/// site, never guessed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Directive {
    /// Scroll a named section into view
    Scroll { section: String },
    /// Highlight a described element
    Highlight { element: String },
    /// Pulse a call-to-action button
    PulseCta { element: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_round_trip() {
        let d: Directive = serde_json::from_str(r#"{"action":"scroll","section":"pricing"}"#).unwrap();
        assert_eq!(
            d,
            Directive::Scroll {
                section: "pricing".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_directive_tag_rejected() {
        let parsed: Result<Directive, _> =
            serde_json::from_str(r#"{"action":"teleport","section":"pricing"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_pulse_cta_tag() {
        let d: Directive =
            serde_json::from_str(r#"{"action":"pulse_cta","element":"signup"}"#).unwrap();
        assert!(matches!(d, Directive::PulseCta { .. }));
    }
}
