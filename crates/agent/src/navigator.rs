//! Navigation agent
//!
//! Turns a parsed intent into an ordered action plan, executes it against
//! the action executor (with an inter-action gap for multi-step plans), and
//! renders a deterministic user-facing response. Per-action failures are
//! isolated: execution keeps going and the response degrades gracefully.

use crate::intent::IntentParser;
use blitsum_config::constants::actions as timing;
use blitsum_core::text::truncate_graphemes;
use blitsum_core::{
    ActionKind, ActionOutcome, IntentKind, IntentTarget, PageContext, ParsedIntent, PlannedAction,
};
use blitsum_page::ActionExecutor;
use parking_lot::Mutex;
use std::sync::Arc;

/// Outcome of one `navigate` call
#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub success: bool,
    pub response: String,
    pub plan: Vec<PlannedAction>,
    pub outcomes: Vec<ActionOutcome>,
}

/// Plans and executes page navigation from user utterances
pub struct NavigationAgent {
    executor: Arc<ActionExecutor>,
    context: Mutex<Arc<PageContext>>,
    history: Mutex<Vec<String>>,
}

impl NavigationAgent {
    pub fn new(executor: Arc<ActionExecutor>, context: Arc<PageContext>) -> Self {
        Self {
            executor,
            context: Mutex::new(context),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Swap in a fresh page context after re-extraction
    pub fn update_context(&self, context: Arc<PageContext>) {
        *self.context.lock() = context;
    }

    /// Parse, plan, execute, respond
    pub async fn navigate(&self, input: &str) -> NavigationResult {
        let ctx = Arc::clone(&self.context.lock());
        let parsed = IntentParser::parse(input, &ctx);
        self.history.lock().push(input.to_string());

        if parsed.confidence < 0.5 {
            return NavigationResult {
                success: false,
                response: Self::suggestion(&ctx),
                plan: Vec::new(),
                outcomes: Vec::new(),
            };
        }

        let plan = Self::plan_actions(&parsed);
        if plan.is_empty() {
            return NavigationResult {
                success: false,
                response: Self::suggestion(&ctx),
                plan,
                outcomes: Vec::new(),
            };
        }

        let mut outcomes = Vec::with_capacity(plan.len());
        for (index, action) in plan.iter().enumerate() {
            if index > 0 && plan.len() > 1 {
                tokio::time::sleep(timing::INTER_ACTION_DELAY).await;
            }
            let outcome = self.executor.execute(action, &ctx).await;
            if let Some(error) = &outcome.error {
                tracing::debug!(action = ?action.kind, error, "navigation action failed");
            }
            outcomes.push(outcome);
        }

        let success = outcomes.iter().any(|o| o.success);
        let response = if success {
            Self::response_for(&parsed, &outcomes)
        } else {
            format!(
                "I couldn't find that. I can show you: {}.",
                Self::category_list(&ctx)
            )
        };

        NavigationResult {
            success,
            response,
            plan,
            outcomes,
        }
    }

    /// Ordered action plan per intent
    fn plan_actions(parsed: &ParsedIntent) -> Vec<PlannedAction> {
        let mut plan = Vec::new();
        let target_known = parsed.target != IntentTarget::Unknown;

        match parsed.intent {
            IntentKind::Navigate => {
                plan.push(
                    PlannedAction {
                        kind: ActionKind::Navigate,
                        target: target_known.then_some(parsed.target),
                        entities: parsed.entities.clone(),
                    },
                );
            }
            IntentKind::Compare if parsed.entities.len() >= 2 => {
                if target_known {
                    plan.push(PlannedAction::navigate(parsed.target));
                }
                plan.push(PlannedAction {
                    kind: ActionKind::Compare,
                    target: None,
                    entities: parsed.entities.clone(),
                });
            }
            IntentKind::Compare => {
                // not enough entities to compare; treat as navigation
                if target_known {
                    plan.push(PlannedAction::navigate(parsed.target));
                }
            }
            IntentKind::Highlight => {
                if target_known && !parsed.entities.is_empty() {
                    plan.push(PlannedAction::navigate(parsed.target));
                }
                plan.push(PlannedAction {
                    kind: ActionKind::Focus,
                    target: target_known.then_some(parsed.target),
                    entities: parsed.entities.clone(),
                });
            }
            IntentKind::Read => {
                if target_known && !parsed.entities.is_empty() {
                    plan.push(PlannedAction::navigate(parsed.target));
                }
                plan.push(PlannedAction {
                    kind: ActionKind::Read,
                    target: target_known.then_some(parsed.target),
                    entities: parsed.entities.clone(),
                });
            }
            IntentKind::Click => {
                plan.push(PlannedAction {
                    kind: ActionKind::Click,
                    target: target_known.then_some(parsed.target),
                    entities: parsed.entities.clone(),
                });
            }
            IntentKind::Unknown if target_known => {
                plan.push(PlannedAction::navigate(parsed.target));
            }
            IntentKind::Unknown => {}
        }
        plan
    }

    fn response_for(parsed: &ParsedIntent, outcomes: &[ActionOutcome]) -> String {
        match parsed.intent {
            IntentKind::Navigate | IntentKind::Unknown => match parsed.target {
                IntentTarget::Pricing => "Here's our pricing information.".to_string(),
                IntentTarget::Features => "Here are our features.".to_string(),
                IntentTarget::Signup => "Here's where you can sign up.".to_string(),
                IntentTarget::Faq => "Here are the frequently asked questions.".to_string(),
                IntentTarget::Contact => "Here's how to get in touch.".to_string(),
                IntentTarget::About => "Here's more about the company.".to_string(),
                IntentTarget::Product | IntentTarget::Cta => "Here you go.".to_string(),
                IntentTarget::Unknown => "Here you go.".to_string(),
            },
            IntentKind::Compare => {
                let names = match parsed.entities.as_slice() {
                    [a, b] => format!("{a} and {b}"),
                    entities => entities.join(", "),
                };
                format!("Comparing {names} for you — the differences are highlighted.")
            }
            IntentKind::Highlight => match parsed.entities.first() {
                Some(entity) => format!("Take a look at {entity}."),
                None => "Take a look here.".to_string(),
            },
            IntentKind::Read => {
                let summary = outcomes
                    .iter()
                    .rev()
                    .find_map(|o| o.content.as_deref())
                    .map(|c| truncate_graphemes(c, 200))
                    .unwrap_or_default();
                if summary.is_empty() {
                    "Here's that section.".to_string()
                } else {
                    format!("Here's what it says: {summary}")
                }
            }
            IntentKind::Click => "Done — I clicked that for you.".to_string(),
        }
    }

    fn category_list(ctx: &PageContext) -> String {
        let categories = ctx.available_categories();
        if categories.is_empty() {
            "pricing, features, signup options".to_string()
        } else {
            categories.join(", ")
        }
    }

    fn suggestion(ctx: &PageContext) -> String {
        format!(
            "Could you be more specific? I can show you: {}.",
            Self::category_list(ctx)
        )
    }

    /// Utterances handled so far this session
    pub fn history(&self) -> Vec<String> {
        self.history.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blitsum_page::{PageDocument, PageExtractor};

    const PAGE: &str = r#"
    <html><body>
      <section id="pricing"><h2>Pricing plans</h2>
        <div class="card"><h4>Starter</h4><div>$49/mo</div></div>
        <div class="card"><h4>Pro</h4><div>$199/mo</div></div>
        <div class="card"><h4>Enterprise</h4><div>Custom</div></div>
      </section>
      <a class="btn btn-primary" href="/signup">Get Started</a>
    </body></html>
    "#;

    fn setup() -> (Arc<PageDocument>, NavigationAgent) {
        let doc = Arc::new(PageDocument::from_html("https://acme.dev", PAGE));
        let ctx = Arc::new(PageExtractor::extract(&doc));
        let executor = Arc::new(ActionExecutor::new(Arc::clone(&doc)));
        let agent = NavigationAgent::new(executor, ctx);
        (doc, agent)
    }

    #[tokio::test(start_paused = true)]
    async fn test_pricing_navigation_scenario() {
        let (doc, agent) = setup();
        let result = agent.navigate("show me the pro plan").await;
        assert!(result.success);
        assert_eq!(result.response, "Here's our pricing information.");

        // the pro card is centered in the viewport
        let ctx = PageExtractor::extract(&doc);
        let pro = ctx.content.pricing[1].element;
        let rect = doc.rect(pro).unwrap();
        assert!(doc.viewport().intersects(&rect));
    }

    #[tokio::test(start_paused = true)]
    async fn test_compare_scenario() {
        let (_doc, agent) = setup();
        let result = agent.navigate("compare Starter and Pro").await;
        assert!(result.success);
        assert!(result.response.contains("Comparing Starter and Pro"));
        assert_eq!(result.plan.len(), 2);
        assert_eq!(result.plan[0].kind, ActionKind::Navigate);
        assert_eq!(result.plan[1].kind, ActionKind::Compare);
    }

    #[tokio::test(start_paused = true)]
    async fn test_low_confidence_lists_categories() {
        let (_doc, agent) = setup();
        let result = agent.navigate("hmm interesting thing").await;
        assert!(!result.success);
        assert!(result.response.contains("I can show you:"));
        assert!(result.response.contains("pricing"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigate_is_deterministic() {
        let (_doc, agent) = setup();
        let first = agent.navigate("show me pricing").await;
        let second = agent.navigate("show me pricing").await;
        assert_eq!(first.response, second.response);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_includes_summary() {
        let (_doc, agent) = setup();
        let result = agent.navigate("read the starter plan to me").await;
        assert!(result.success);
        assert!(result.response.contains("Here's what it says:"));
        assert!(result.response.len() <= 230);
    }

    #[tokio::test(start_paused = true)]
    async fn test_actions_execute_in_order() {
        let (_doc, agent) = setup();
        let result = agent.navigate("compare Starter and Pro").await;
        // both actions ran, in plan order
        assert_eq!(result.outcomes.len(), result.plan.len());
    }
}
