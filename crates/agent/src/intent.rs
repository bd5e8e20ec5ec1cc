//! Keyword intent parser
//!
//! Scores the intent verb groups and target noun groups by whole-word
//! matches (phrases match by substring), recognizes entities against the
//! page context, and derives a confidence used to gate the navigation path.

use blitsum_config::keywords;
use blitsum_core::text::contains_word;
use blitsum_core::{IntentKind, IntentTarget, PageContext, ParsedIntent};

pub struct IntentParser;

impl IntentParser {
    /// Normalize an utterance into `{intent, target, entities, confidence}`
    pub fn parse(input: &str, ctx: &PageContext) -> ParsedIntent {
        let input = input.trim();
        if input.is_empty() {
            return ParsedIntent {
                intent: IntentKind::Unknown,
                target: IntentTarget::Unknown,
                entities: Vec::new(),
                confidence: 0.0,
            };
        }

        let (mut intent, intent_score) = Self::best_intent(input);
        let (mut target, target_score) = Self::best_target(input);
        let (entities, inferred_target) = Self::extract_entities(input, ctx);

        // entities carry their source list: "compare Starter and Pro" is a
        // pricing request even without a pricing noun
        if target == IntentTarget::Unknown {
            if let Some(inferred) = inferred_target {
                target = inferred;
            }
        }

        // a clear target with no verb still reads as a navigation request
        if intent_score == 0 && (target_score > 0 || target != IntentTarget::Unknown) {
            intent = IntentKind::Navigate;
        }

        let mut confidence: f32 = 0.0;
        if intent != IntentKind::Unknown {
            confidence += 0.4;
        }
        if target != IntentTarget::Unknown {
            confidence += 0.3;
        }
        if !entities.is_empty() {
            confidence += 0.3;
        }

        ParsedIntent {
            intent,
            target,
            entities,
            confidence: confidence.min(1.0),
        }
    }

    fn best_intent(input: &str) -> (IntentKind, usize) {
        let mut best = (IntentKind::Unknown, 0);
        for (kind, verbs) in keywords::INTENT_VERBS {
            let score = verbs.iter().filter(|v| contains_word(input, v)).count();
            if score > best.1 {
                best = (*kind, score);
            }
        }
        best
    }

    fn best_target(input: &str) -> (IntentTarget, usize) {
        let mut best = (IntentTarget::Unknown, 0);
        for (target, nouns) in keywords::TARGET_NOUNS {
            let score = nouns.iter().filter(|n| contains_word(input, n)).count();
            if score > best.1 {
                best = (*target, score);
            }
        }
        best
    }

    /// Utterance tokens equal to a known plan/product/feature name, plus the
    /// fallback common plan names. Entities keep the utterance's casing and
    /// order of appearance. Also reports which target the matched names
    /// belong to, so plan names imply the pricing section.
    fn extract_entities(input: &str, ctx: &PageContext) -> (Vec<String>, Option<IntentTarget>) {
        let plans: Vec<String> = ctx
            .content
            .pricing
            .iter()
            .map(|p| p.plan.to_lowercase())
            .collect();
        let features: Vec<String> = ctx
            .content
            .features
            .iter()
            .map(|f| f.name.to_lowercase())
            .collect();
        let products: Vec<String> = ctx
            .content
            .products
            .iter()
            .map(|p| p.name.to_lowercase())
            .collect();

        let mut entities: Vec<String> = Vec::new();
        let mut inferred: Option<IntentTarget> = None;
        for token in input.split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            let lower = token.to_lowercase();
            let source = if plans.contains(&lower)
                || keywords::COMMON_PLAN_NAMES.contains(&lower.as_str())
            {
                Some(IntentTarget::Pricing)
            } else if features.contains(&lower) {
                Some(IntentTarget::Features)
            } else if products.contains(&lower) {
                Some(IntentTarget::Product)
            } else {
                None
            };
            if let Some(source) = source {
                if !entities.iter().any(|e| e.eq_ignore_ascii_case(token)) {
                    entities.push(token.to_string());
                }
                inferred.get_or_insert(source);
            }
        }
        (entities, inferred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blitsum_core::{NodeId, PricePeriod, PricingPlan};

    fn ctx_with_plans(names: &[&str]) -> PageContext {
        let mut ctx = PageContext::empty("https://acme.dev");
        for name in names {
            ctx.content.pricing.push(PricingPlan {
                plan: name.to_string(),
                price: "$49".to_string(),
                price_value: Some(49.0),
                currency: Some("$".to_string()),
                period: Some(PricePeriod::Monthly),
                features: vec![],
                popular: false,
                element: NodeId(0),
            });
        }
        ctx
    }

    #[test]
    fn test_show_me_the_pro_plan() {
        let ctx = ctx_with_plans(&["Starter", "Pro", "Enterprise"]);
        let parsed = IntentParser::parse("show me the pro plan", &ctx);
        assert_eq!(parsed.intent, IntentKind::Navigate);
        assert_eq!(parsed.target, IntentTarget::Pricing);
        assert_eq!(parsed.entities, vec!["pro"]);
        assert!(parsed.confidence >= 0.7);
        assert!(parsed.is_navigation_request());
    }

    #[test]
    fn test_compare_preserves_casing() {
        let ctx = ctx_with_plans(&["Starter", "Pro"]);
        let parsed = IntentParser::parse("compare Starter and Pro", &ctx);
        assert_eq!(parsed.intent, IntentKind::Compare);
        assert_eq!(parsed.entities, vec!["Starter", "Pro"]);
    }

    #[test]
    fn test_target_without_verb_defaults_to_navigate() {
        let ctx = PageContext::empty("https://acme.dev");
        let parsed = IntentParser::parse("pricing?", &ctx);
        assert_eq!(parsed.intent, IntentKind::Navigate);
        assert_eq!(parsed.target, IntentTarget::Pricing);
    }

    #[test]
    fn test_low_confidence_chatter() {
        let ctx = PageContext::empty("https://acme.dev");
        let parsed = IntentParser::parse("hmm interesting thing", &ctx);
        assert!(parsed.confidence < 0.5);
        assert!(!parsed.is_navigation_request());
    }

    #[test]
    fn test_confidence_bounded() {
        let ctx = ctx_with_plans(&["Pro"]);
        let parsed = IntentParser::parse("show compare read click the pro pricing plan", &ctx);
        assert!(parsed.confidence <= 1.0);
    }

    #[test]
    fn test_fallback_plan_names() {
        let ctx = PageContext::empty("https://acme.dev");
        let parsed = IntentParser::parse("show me the premium tier", &ctx);
        assert_eq!(parsed.entities, vec!["premium"]);
    }

    #[test]
    fn test_word_boundaries_not_substrings() {
        let ctx = ctx_with_plans(&["Pro"]);
        // "improve" must not match the verb "pro(ve)" or entity "pro"
        let parsed = IntentParser::parse("improve everything", &ctx);
        assert!(parsed.entities.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let ctx = PageContext::empty("https://acme.dev");
        let parsed = IntentParser::parse("   ", &ctx);
        assert_eq!(parsed.intent, IntentKind::Unknown);
        assert_eq!(parsed.confidence, 0.0);
    }
}
