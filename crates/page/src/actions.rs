//! Action executor
//!
//! Performs navigate/highlight/compare/read/click/focus against the page
//! document with visual feedback. Every inline-style mutation snapshots the
//! prior values and restores them on a timer; no effect outlives the 10 s
//! bound, and teardown restores anything still pending.

use crate::document::PageDocument;
use crate::finder::ElementFinder;
use blitsum_config::constants::actions as timing;
use blitsum_core::{ActionKind, ActionOutcome, Directive, NodeId, PageContext, PlannedAction};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Outline palette for plan comparison, by entity index
const COMPARE_PALETTE: &[&str] = &["#6366f1", "#f59e0b", "#10b981"];

const PULSE_CLASS: &str = "blitsum-pulse";

struct PendingEffect {
    node: NodeId,
    styles: HashMap<String, String>,
    classes_added: Vec<String>,
    handle: Option<JoinHandle<()>>,
}

/// Executes page actions with paired, timer-driven restores
pub struct ActionExecutor {
    doc: Arc<PageDocument>,
    pending: Arc<Mutex<HashMap<u64, PendingEffect>>>,
    next_effect: AtomicU64,
}

impl ActionExecutor {
    pub fn new(doc: Arc<PageDocument>) -> Self {
        Self {
            doc,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_effect: AtomicU64::new(0),
        }
    }

    /// Dispatch one planned action
    pub async fn execute(&self, action: &PlannedAction, ctx: &PageContext) -> ActionOutcome {
        let primary = action
            .entities
            .first()
            .map(|e| e.as_str())
            .or(action.target.map(|t| t.as_str()))
            .unwrap_or_default()
            .to_string();

        match action.kind {
            ActionKind::Navigate => self.navigate_to_element(&primary, ctx, true).await,
            ActionKind::Compare => {
                let descs: Vec<&str> = action.entities.iter().map(|e| e.as_str()).collect();
                self.compare_elements(&descs, ctx, timing::COMPARE_DURATION).await
            }
            ActionKind::Highlight => {
                self.highlight_element(&primary, ctx, timing::HIGHLIGHT_DURATION).await
            }
            ActionKind::Focus => self.focus_element(&primary, ctx, timing::FOCUS_DURATION).await,
            ActionKind::Read => self.read_element_content(&primary, ctx),
            ActionKind::Click => self.click_element(&primary, ctx).await,
            ActionKind::PulseCta => self.pulse_cta(&primary, ctx).await,
        }
    }

    /// Dispatch an assistant-emitted directive
    pub async fn dispatch_directive(&self, directive: &Directive, ctx: &PageContext) -> ActionOutcome {
        match directive {
            Directive::Scroll { section } => self.scroll_to_section(section, ctx),
            Directive::Highlight { element } => {
                self.highlight_element(element, ctx, timing::HIGHLIGHT_DURATION).await
            }
            Directive::PulseCta { element } => self.pulse_cta(element, ctx).await,
        }
    }

    /// Smooth-scroll a named section into view
    pub fn scroll_to_section(&self, section: &str, ctx: &PageContext) -> ActionOutcome {
        let node = self
            .doc
            .visible_nodes()
            .into_iter()
            .find(|id| {
                self.doc
                    .dom_id(*id)
                    .map(|d| d.eq_ignore_ascii_case(section))
                    .unwrap_or(false)
            })
            .or_else(|| ElementFinder::find(&self.doc, section, ctx));
        match node {
            Some(node) => {
                let visible = self.doc.scroll_into_view(node, false);
                ActionOutcome {
                    is_visible: visible,
                    ..ActionOutcome::ok()
                }
            }
            None => ActionOutcome::failed("Section not found"),
        }
    }

    /// Glow + slight scale, restored after `duration`
    pub async fn highlight_element(
        &self,
        description: &str,
        ctx: &PageContext,
        duration: Duration,
    ) -> ActionOutcome {
        let Some(node) = ElementFinder::find(&self.doc, description, ctx) else {
            return ActionOutcome::failed(format!("element not found: {description}"));
        };
        self.apply_timed_effect(
            node,
            &[
                ("box-shadow", "0 0 24px rgba(99, 102, 241, 0.8)"),
                ("transform", "scale(1.02)"),
                ("transition", "all 0.3s ease"),
            ],
            &[],
            duration,
        );
        ActionOutcome::ok()
    }

    /// Toggle the pulse class for three seconds
    pub async fn pulse_cta(&self, description: &str, ctx: &PageContext) -> ActionOutcome {
        let Some(node) = ElementFinder::find(&self.doc, description, ctx) else {
            return ActionOutcome::failed(format!("element not found: {description}"));
        };
        self.apply_timed_effect(node, &[], &[PULSE_CLASS], timing::PULSE_DURATION);
        ActionOutcome::ok()
    }

    /// Resolve and center-scroll to an element
    pub async fn navigate_to_element(
        &self,
        description: &str,
        ctx: &PageContext,
        _smooth: bool,
    ) -> ActionOutcome {
        let Some(node) = ElementFinder::find(&self.doc, description, ctx) else {
            return ActionOutcome::failed(format!("element not found: {description}"));
        };
        let visible = self.doc.scroll_into_view(node, true);
        ActionOutcome {
            is_visible: visible,
            ..ActionOutcome::ok()
        }
    }

    /// Outline each resolved element in a distinct color simultaneously,
    /// restoring all of them exactly at the duration end
    pub async fn compare_elements(
        &self,
        descriptions: &[&str],
        ctx: &PageContext,
        duration: Duration,
    ) -> ActionOutcome {
        let mut resolved = Vec::new();
        for desc in descriptions {
            match ElementFinder::find(&self.doc, desc, ctx) {
                Some(node) => resolved.push(node),
                None => return ActionOutcome::failed(format!("element not found: {desc}")),
            }
        }
        if resolved.len() < 2 {
            return ActionOutcome::failed("need at least two elements to compare");
        }
        for (index, node) in resolved.iter().enumerate() {
            let color = COMPARE_PALETTE[index % COMPARE_PALETTE.len()];
            self.apply_timed_effect(
                *node,
                &[
                    ("outline", &format!("3px solid {color}")),
                    ("box-shadow", &format!("0 0 18px {color}")),
                    ("transform", "scale(1.03)"),
                ],
                &[],
                duration,
            );
        }
        ActionOutcome::ok()
    }

    /// Return the cleaned text content of the resolved element
    pub fn read_element_content(&self, description: &str, ctx: &PageContext) -> ActionOutcome {
        let Some(node) = ElementFinder::find(&self.doc, description, ctx) else {
            return ActionOutcome::failed(format!("element not found: {description}"));
        };
        let content = self.doc.text_content(node);
        ActionOutcome::ok().with_content(content)
    }

    /// Scroll to a clickable element, settle, then click it.
    /// Non-interactive targets are rejected.
    pub async fn click_element(&self, description: &str, ctx: &PageContext) -> ActionOutcome {
        let Some(node) = ElementFinder::find(&self.doc, description, ctx) else {
            return ActionOutcome::failed(format!("element not found: {description}"));
        };
        if !self.is_clickable(node) {
            return ActionOutcome::failed(format!("element is not clickable: {description}"));
        }
        self.doc.scroll_into_view(node, true);
        tokio::time::sleep(timing::CLICK_SETTLE).await;
        self.doc.click(node);
        ActionOutcome::ok()
    }

    /// Scroll, settle, then apply a strong glow and raised stacking order
    pub async fn focus_element(
        &self,
        description: &str,
        ctx: &PageContext,
        duration: Duration,
    ) -> ActionOutcome {
        let Some(node) = ElementFinder::find(&self.doc, description, ctx) else {
            return ActionOutcome::failed(format!("element not found: {description}"));
        };
        let visible = self.doc.scroll_into_view(node, true);
        tokio::time::sleep(timing::FOCUS_SETTLE).await;
        self.apply_timed_effect(
            node,
            &[
                ("box-shadow", "0 0 36px rgba(99, 102, 241, 0.95)"),
                ("transform", "scale(1.05)"),
                ("z-index", "9999"),
                ("position", "relative"),
            ],
            &[],
            duration,
        );
        ActionOutcome {
            is_visible: visible,
            ..ActionOutcome::ok()
        }
    }

    fn is_clickable(&self, node: NodeId) -> bool {
        let tag = self.doc.tag(node).unwrap_or_default();
        tag == "button"
            || tag == "a"
            || self.doc.attr(node, "role").as_deref() == Some("button")
            || self.doc.attr(node, "onclick").is_some()
    }

    /// Apply styles/classes and schedule the paired restore. The duration
    /// is clamped to the global effect bound.
    fn apply_timed_effect(
        &self,
        node: NodeId,
        styles: &[(&str, &str)],
        classes: &[&str],
        duration: Duration,
    ) {
        let duration = duration.min(timing::MAX_EFFECT_DURATION);
        let snapshot = self.doc.inline_styles(node);
        for (prop, value) in styles {
            self.doc.set_inline_style(node, prop, value);
        }
        for class in classes {
            self.doc.add_class(node, class);
        }

        let effect_id = self.next_effect.fetch_add(1, Ordering::Relaxed);
        let pending = Arc::clone(&self.pending);
        let doc = Arc::clone(&self.doc);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(effect) = pending.lock().remove(&effect_id) {
                Self::restore_effect(&doc, effect);
            }
        });

        self.pending.lock().insert(
            effect_id,
            PendingEffect {
                node,
                styles: snapshot,
                classes_added: classes.iter().map(|c| c.to_string()).collect(),
                handle: Some(handle),
            },
        );
    }

    fn restore_effect(doc: &PageDocument, effect: PendingEffect) {
        doc.restore_inline_styles(effect.node, effect.styles);
        for class in &effect.classes_added {
            doc.remove_class(effect.node, class);
        }
    }

    /// Restore every pending effect immediately. Called when the component
    /// is torn down before restore timers fire.
    pub fn teardown(&self) {
        let mut pending = self.pending.lock();
        for (_, mut effect) in pending.drain() {
            if let Some(handle) = effect.handle.take() {
                handle.abort();
            }
            Self::restore_effect(&self.doc, effect);
        }
    }

    /// Number of effects whose restore is still scheduled
    pub fn pending_effects(&self) -> usize {
        self.pending.lock().len()
    }
}

impl Drop for ActionExecutor {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::PageExtractor;

    const PAGE: &str = r#"
    <html><body>
      <section id="pricing"><h2>Pricing plans</h2>
        <div class="card"><h4>Starter</h4><div>$49/mo</div></div>
        <div class="card"><h4>Pro</h4><div>$199/mo</div></div>
      </section>
      <a class="btn btn-primary" href="/signup">Get Started</a>
      <p id="blurb">Plain text paragraph</p>
    </body></html>
    "#;

    fn setup() -> (Arc<PageDocument>, PageContext, ActionExecutor) {
        let doc = Arc::new(PageDocument::from_html("https://acme.dev", PAGE));
        let ctx = PageExtractor::extract(&doc);
        let exec = ActionExecutor::new(Arc::clone(&doc));
        (doc, ctx, exec)
    }

    #[tokio::test(start_paused = true)]
    async fn test_highlight_restores_inline_styles() {
        let (doc, ctx, exec) = setup();
        let node = ctx.content.pricing[0].element;
        let before = doc.inline_styles(node);

        let outcome = exec
            .highlight_element("Starter", &ctx, Duration::from_secs(2))
            .await;
        assert!(outcome.success);
        assert!(doc.inline_style(node, "box-shadow").is_some());

        tokio::time::advance(Duration::from_millis(2100)).await;
        tokio::task::yield_now().await;
        assert_eq!(doc.inline_styles(node), before);
        assert_eq!(exec.pending_effects(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_compare_applies_distinct_colors() {
        let (doc, ctx, exec) = setup();
        let outcome = exec
            .compare_elements(&["Starter", "Pro"], &ctx, Duration::from_secs(3))
            .await;
        assert!(outcome.success);

        let a = doc
            .inline_style(ctx.content.pricing[0].element, "outline")
            .unwrap();
        let b = doc
            .inline_style(ctx.content.pricing[1].element, "outline")
            .unwrap();
        assert_ne!(a, b);

        tokio::time::advance(Duration::from_millis(3100)).await;
        tokio::task::yield_now().await;
        assert!(doc
            .inline_style(ctx.content.pricing[0].element, "outline")
            .is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_rejects_non_interactive() {
        let (_doc, ctx, exec) = setup();
        let outcome = exec.click_element("blurb", &ctx).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("not clickable"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_after_settle() {
        let (doc, ctx, exec) = setup();
        let outcome = exec.click_element("Get Started", &ctx).await;
        assert!(outcome.success);
        assert_eq!(doc.click_log().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_to_missing_section() {
        let (_doc, ctx, exec) = setup();
        let outcome = exec.scroll_to_section("no-such-section-zzz", &ctx);
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("Section not found"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_element_content() {
        let (_doc, ctx, exec) = setup();
        let outcome = exec.read_element_content("Starter", &ctx);
        assert!(outcome.success);
        assert!(outcome.content.unwrap().contains("$49"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_restores_pending() {
        let (doc, ctx, exec) = setup();
        let node = ctx.content.pricing[0].element;
        exec.highlight_element("Starter", &ctx, Duration::from_secs(5))
            .await;
        assert!(doc.inline_style(node, "box-shadow").is_some());

        exec.teardown();
        assert!(doc.inline_style(node, "box-shadow").is_none());
        assert_eq!(exec.pending_effects(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pulse_toggles_class() {
        let (doc, ctx, exec) = setup();
        let outcome = exec.pulse_cta("Get Started", &ctx).await;
        assert!(outcome.success);
        let cta = ctx.content.ctas[0].element;
        assert!(doc.has_class(cta, PULSE_CLASS));

        tokio::time::advance(Duration::from_millis(3100)).await;
        tokio::task::yield_now().await;
        assert!(!doc.has_class(cta, PULSE_CLASS));
    }
}
