//! Engagement trigger engine
//!
//! Evaluates the priority-ordered rule table against behavior snapshots —
//! on every behavior event and on a periodic tick. At most one rule fires
//! per evaluation cycle; fired rules respect their cooldown. The default
//! rule table is empty; deployments supply their own rules.

use crate::behavior::BehaviorTracker;
use blitsum_config::constants::shell::TRIGGER_TICK;
use blitsum_config::{TriggerPriority, TriggerRule};
use blitsum_core::BehaviorSnapshot;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// A proactive message produced by a fired rule
#[derive(Debug, Clone)]
pub struct FiredTrigger {
    pub rule_id: String,
    pub priority: TriggerPriority,
    pub message: String,
}

/// Rule evaluation engine
pub struct EngagementEngine {
    /// Rules sorted by priority, highest first
    rules: Vec<TriggerRule>,
    last_fired: Mutex<HashMap<String, Instant>>,
    tx: mpsc::Sender<FiredTrigger>,
}

impl EngagementEngine {
    /// Build the engine; fired triggers arrive on the returned receiver
    pub fn new(mut rules: Vec<TriggerRule>) -> (Arc<Self>, mpsc::Receiver<FiredTrigger>) {
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        let (tx, rx) = mpsc::channel(16);
        (
            Arc::new(Self {
                rules,
                last_fired: Mutex::new(HashMap::new()),
                tx,
            }),
            rx,
        )
    }

    /// Evaluate one cycle. The first matching, cooldown-clear rule is
    /// scheduled (after its delay); at most one per cycle.
    pub fn evaluate(&self, behavior: &BehaviorSnapshot) -> Option<String> {
        for rule in &self.rules {
            let cooling = {
                let last = self.last_fired.lock();
                last.get(&rule.id)
                    .map(|at| at.elapsed() < rule.cooldown)
                    .unwrap_or(false)
            };
            if cooling {
                continue;
            }
            if !rule.condition.evaluate(behavior) {
                continue;
            }

            self.last_fired.lock().insert(rule.id.clone(), Instant::now());
            let fired = FiredTrigger {
                rule_id: rule.id.clone(),
                priority: rule.priority,
                message: rule.message.clone(),
            };
            let delay = rule.delay;
            let tx = self.tx.clone();
            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let _ = tx.send(fired).await;
            });
            tracing::debug!(rule = %rule.id, "engagement trigger scheduled");
            return Some(rule.id.clone());
        }
        None
    }

    /// Wire the engine to a tracker: evaluate on every behavior event and
    /// on the periodic tick. Returns the tick task handle.
    pub fn run(engine: &Arc<Self>, tracker: &Arc<BehaviorTracker>) -> JoinHandle<()> {
        let listener_engine = Arc::clone(engine);
        tracker.add_listener(Box::new(move |_event, snapshot| {
            listener_engine.evaluate(snapshot);
        }));

        let engine = Arc::clone(engine);
        let tracker = Arc::clone(tracker);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(TRIGGER_TICK);
            tick.tick().await;
            loop {
                tick.tick().await;
                engine.evaluate(&tracker.snapshot());
            }
        })
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blitsum_config::TriggerCondition;
    use std::time::Duration;

    fn rule(id: &str, priority: TriggerPriority, condition: TriggerCondition) -> TriggerRule {
        TriggerRule {
            id: id.to_string(),
            priority,
            condition,
            cooldown: Duration::from_secs(60),
            delay: Duration::from_millis(0),
            message: format!("message for {id}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_table_fires_nothing() {
        let (engine, mut rx) = EngagementEngine::new(blitsum_config::triggers::default_rules());
        assert_eq!(engine.rule_count(), 0);
        let mut behavior = BehaviorSnapshot::new();
        behavior.time_on_page_secs = 1000;
        behavior.exit_intent_detected = true;
        assert!(engine.evaluate(&behavior).is_none());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_priority_order_one_per_cycle() {
        let (engine, mut rx) = EngagementEngine::new(vec![
            rule("low", TriggerPriority::Low, TriggerCondition::ExitIntent),
            rule(
                "critical",
                TriggerPriority::Critical,
                TriggerCondition::ExitIntent,
            ),
        ]);
        let mut behavior = BehaviorSnapshot::new();
        behavior.exit_intent_detected = true;

        let fired = engine.evaluate(&behavior);
        assert_eq!(fired.as_deref(), Some("critical"));

        tokio::task::yield_now().await;
        let received = rx.try_recv().unwrap();
        assert_eq!(received.rule_id, "critical");
        // only one trigger per cycle
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_respected() {
        let (engine, _rx) = EngagementEngine::new(vec![rule(
            "exit",
            TriggerPriority::High,
            TriggerCondition::ExitIntent,
        )]);
        let mut behavior = BehaviorSnapshot::new();
        behavior.exit_intent_detected = true;

        assert!(engine.evaluate(&behavior).is_some());
        // inside cooldown: nothing fires
        assert!(engine.evaluate(&behavior).is_none());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(engine.evaluate(&behavior).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_before_delivery() {
        let (engine, mut rx) = EngagementEngine::new(vec![TriggerRule {
            id: "delayed".to_string(),
            priority: TriggerPriority::Medium,
            condition: TriggerCondition::ExitIntent,
            cooldown: Duration::from_secs(60),
            delay: Duration::from_secs(2),
            message: "still there?".to_string(),
        }]);
        let mut behavior = BehaviorSnapshot::new();
        behavior.exit_intent_detected = true;

        engine.evaluate(&behavior);
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(2100)).await;
        tokio::task::yield_now().await;
        assert_eq!(rx.try_recv().unwrap().message, "still there?");
    }
}
