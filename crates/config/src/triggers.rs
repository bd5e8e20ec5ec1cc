//! Engagement trigger rule table
//!
//! Rules are data: a declarative condition over the behavior snapshot, a
//! priority, a cooldown and a proactive message. The shipped table is empty;
//! embedders enable rules by constructing the engine with their own table.

use blitsum_core::BehaviorSnapshot;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rule priority, evaluated highest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// Declarative condition over the behavior snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Visitor has been on the page at least this many seconds
    MinTimeOnPage { secs: u64 },
    /// Max scroll depth reached at least this fraction
    MinScrollDepth { depth: f64 },
    /// Pricing section has been viewed
    PricingViewed,
    /// Features section has been viewed
    FeaturesViewed,
    /// Exit intent was detected
    ExitIntent,
    /// Visitor hovered a CTA at least this many times without clicking
    CtaHoveredNotClicked { min_hovers: u32 },
    /// Visitor compared plans at least this many times
    MinPlanComparisons { count: u32 },
    /// All sub-conditions hold
    All { conditions: Vec<TriggerCondition> },
    /// Any sub-condition holds
    Any { conditions: Vec<TriggerCondition> },
}

impl TriggerCondition {
    /// Evaluate against a behavior snapshot
    pub fn evaluate(&self, behavior: &BehaviorSnapshot) -> bool {
        match self {
            TriggerCondition::MinTimeOnPage { secs } => behavior.time_on_page_secs >= *secs,
            TriggerCondition::MinScrollDepth { depth } => behavior.max_scroll_depth >= *depth,
            TriggerCondition::PricingViewed => behavior.pricing_viewed,
            TriggerCondition::FeaturesViewed => behavior.features_viewed,
            TriggerCondition::ExitIntent => behavior.exit_intent_detected,
            TriggerCondition::CtaHoveredNotClicked { min_hovers } => {
                behavior.cta_hovered >= *min_hovers && behavior.cta_clicked == 0
            }
            TriggerCondition::MinPlanComparisons { count } => behavior.plan_comparisons >= *count,
            TriggerCondition::All { conditions } => {
                conditions.iter().all(|c| c.evaluate(behavior))
            }
            TriggerCondition::Any { conditions } => {
                conditions.iter().any(|c| c.evaluate(behavior))
            }
        }
    }
}

/// One engagement rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerRule {
    pub id: String,
    pub priority: TriggerPriority,
    pub condition: TriggerCondition,
    /// Minimum time between firings of this rule
    #[serde(with = "duration_millis")]
    pub cooldown: Duration,
    /// Delay between the condition matching and the message surfacing
    #[serde(with = "duration_millis")]
    pub delay: Duration,
    pub message: String,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// The shipped rule table. Intentionally empty: proactive nudges are
/// opt-in per deployment.
pub fn default_rules() -> Vec<TriggerRule> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_empty() {
        assert!(default_rules().is_empty());
    }

    #[test]
    fn test_condition_evaluation() {
        let mut behavior = BehaviorSnapshot::new();
        behavior.time_on_page_secs = 45;
        behavior.record_scroll(0.7);
        behavior.pricing_viewed = true;

        assert!(TriggerCondition::MinTimeOnPage { secs: 30 }.evaluate(&behavior));
        assert!(!TriggerCondition::MinTimeOnPage { secs: 60 }.evaluate(&behavior));
        assert!(TriggerCondition::All {
            conditions: vec![
                TriggerCondition::PricingViewed,
                TriggerCondition::MinScrollDepth { depth: 0.5 },
            ],
        }
        .evaluate(&behavior));
    }

    #[test]
    fn test_hover_without_click() {
        let mut behavior = BehaviorSnapshot::new();
        behavior.cta_hovered = 3;
        let cond = TriggerCondition::CtaHoveredNotClicked { min_hovers: 2 };
        assert!(cond.evaluate(&behavior));

        behavior.cta_clicked = 1;
        assert!(!cond.evaluate(&behavior));
    }

    #[test]
    fn test_rule_round_trip() {
        let rule = TriggerRule {
            id: "pricing-dwell".to_string(),
            priority: TriggerPriority::High,
            condition: TriggerCondition::PricingViewed,
            cooldown: Duration::from_secs(60),
            delay: Duration::from_secs(2),
            message: "Questions about pricing? I can compare plans for you.".to_string(),
        };
        let json = serde_json::to_string(&rule).unwrap();
        let back: TriggerRule = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cooldown, Duration::from_secs(60));
    }
}
