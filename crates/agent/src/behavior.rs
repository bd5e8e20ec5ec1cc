//! Behavior tracker
//!
//! One process-wide service observing host page events: scroll depth,
//! mouse movement, CTA hover/click, exit intent and section visibility.
//! `init` is idempotent; `teardown` stops the clock task. Listeners receive
//! the event name plus a snapshot copy; the snapshot itself is mutated only
//! here.

use blitsum_core::text::contains_word;
use blitsum_core::{BehaviorSnapshot, NodeId};
use blitsum_config::keywords;
use blitsum_page::PageDocument;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Host page events fed into the tracker
#[derive(Debug, Clone)]
pub enum BehaviorEvent {
    /// Scroll position as a document fraction
    Scroll { depth: f64 },
    MouseMove,
    /// Pointer left the window; `client_y <= 0` reads as exit intent
    PointerLeave { client_y: f64 },
    /// Pointer entered an interactive element
    Hover { node: NodeId },
    Click { node: NodeId },
    /// A chat message was sent through the shell
    MessageSent,
    /// The visitor triggered a plan comparison
    PlanComparison,
}

type Listener = Box<dyn Fn(&str, &BehaviorSnapshot) + Send + Sync>;

/// Behavior tracking service
pub struct BehaviorTracker {
    doc: Arc<PageDocument>,
    snapshot: Arc<Mutex<BehaviorSnapshot>>,
    listeners: Arc<Mutex<HashMap<u64, Listener>>>,
    next_listener: Mutex<u64>,
    initialized: AtomicBool,
    clock: Mutex<Option<JoinHandle<()>>>,
    last_scroll_notify: Mutex<Option<Instant>>,
}

/// Notification gap for scroll events; the snapshot itself updates on every
/// event
const SCROLL_NOTIFY_DEBOUNCE: Duration = Duration::from_millis(150);

impl BehaviorTracker {
    pub fn new(doc: Arc<PageDocument>) -> Arc<Self> {
        Arc::new(Self {
            doc,
            snapshot: Arc::new(Mutex::new(BehaviorSnapshot::new())),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener: Mutex::new(0),
            initialized: AtomicBool::new(false),
            clock: Mutex::new(None),
            last_scroll_notify: Mutex::new(None),
        })
    }

    /// Start the 1 Hz time-on-page clock. Calling twice is equivalent to
    /// calling once.
    pub fn init(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }
        let snapshot = Arc::clone(&self.snapshot);
        let listeners = Arc::clone(&self.listeners);
        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(1));
            tick.tick().await;
            loop {
                tick.tick().await;
                {
                    let mut snapshot = snapshot.lock();
                    snapshot.time_on_page_secs += 1;
                }
                notify_listeners(&listeners, "tick", &snapshot.lock().clone());
            }
        });
        *self.clock.lock() = Some(handle);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Stop the clock; the snapshot is retained
    pub fn teardown(&self) {
        if let Some(handle) = self.clock.lock().take() {
            handle.abort();
        }
        self.initialized.store(false, Ordering::SeqCst);
    }

    /// Reset the snapshot for a fresh session
    pub fn reset(&self) {
        *self.snapshot.lock() = BehaviorSnapshot::new();
    }

    /// Current snapshot copy
    pub fn snapshot(&self) -> BehaviorSnapshot {
        self.snapshot.lock().clone()
    }

    pub fn add_listener(&self, listener: Listener) -> u64 {
        let mut next = self.next_listener.lock();
        let id = *next;
        *next += 1;
        self.listeners.lock().insert(id, listener);
        id
    }

    pub fn remove_listener(&self, id: u64) {
        self.listeners.lock().remove(&id);
    }

    fn notify(&self, event: &str) {
        let snapshot = self.snapshot();
        notify_listeners(&self.listeners, event, &snapshot);
    }

    /// Feed one host event into the tracker
    pub fn handle_event(&self, event: BehaviorEvent) {
        match event {
            BehaviorEvent::Scroll { depth } => {
                {
                    let mut snapshot = self.snapshot.lock();
                    snapshot.record_scroll(depth);
                }
                self.update_section_visibility();
                // scroll notifications are debounced; state is not
                let should_notify = {
                    let mut last = self.last_scroll_notify.lock();
                    match *last {
                        Some(at) if at.elapsed() < SCROLL_NOTIFY_DEBOUNCE => false,
                        _ => {
                            *last = Some(Instant::now());
                            true
                        }
                    }
                };
                if should_notify {
                    self.notify("scroll");
                }
            }
            BehaviorEvent::MouseMove => {
                {
                    let mut snapshot = self.snapshot.lock();
                    snapshot.mouse_movements += 1;
                    snapshot.touch();
                }
                self.notify("mouse_move");
            }
            BehaviorEvent::PointerLeave { client_y } => {
                if client_y <= 0.0 {
                    {
                        let mut snapshot = self.snapshot.lock();
                        snapshot.exit_intent_detected = true;
                        snapshot.touch();
                    }
                    self.notify("exit_intent");
                }
            }
            BehaviorEvent::Hover { node } => {
                if self.is_cta(node) {
                    {
                        let mut snapshot = self.snapshot.lock();
                        snapshot.cta_hovered += 1;
                        snapshot.touch();
                    }
                    self.notify("cta_hover");
                }
            }
            BehaviorEvent::Click { node } => {
                if self.is_cta(node) {
                    {
                        let mut snapshot = self.snapshot.lock();
                        snapshot.cta_clicked += 1;
                        snapshot.touch();
                    }
                    self.notify("cta_click");
                }
            }
            BehaviorEvent::MessageSent => {
                {
                    let mut snapshot = self.snapshot.lock();
                    snapshot.messages_sent += 1;
                    snapshot.touch();
                }
                self.notify("message_sent");
            }
            BehaviorEvent::PlanComparison => {
                {
                    let mut snapshot = self.snapshot.lock();
                    snapshot.plan_comparisons += 1;
                    snapshot.touch();
                }
                self.notify("plan_comparison");
            }
        }
    }

    /// CTA classification: verb in visible text, or a primary-button class
    fn is_cta(&self, node: NodeId) -> bool {
        let tag = self.doc.tag(node).unwrap_or_default();
        if tag != "button" && tag != "a" {
            return false;
        }
        let text = self.doc.text_content(node).to_lowercase();
        if keywords::CTA_VERBS.iter().any(|v| contains_word(&text, v)) {
            return true;
        }
        let classes = self.doc.classes(node).join(" ").to_lowercase();
        classes.contains("btn-primary") || classes.contains("cta")
    }

    /// Mark pricing/features viewed when their sections intersect the
    /// viewport
    fn update_section_visibility(&self) {
        let vp = self.doc.viewport();
        for id in self.doc.visible_nodes() {
            let Some(dom_id) = self.doc.dom_id(id) else { continue };
            let Some(rect) = self.doc.rect(id) else { continue };
            if !vp.intersects(&rect) {
                continue;
            }
            let dom_id = dom_id.to_lowercase();
            let mut snapshot = self.snapshot.lock();
            if dom_id.contains("pricing") {
                snapshot.pricing_viewed = true;
            } else if dom_id.contains("feature") {
                snapshot.features_viewed = true;
            }
        }
    }
}

fn notify_listeners(
    listeners: &Arc<Mutex<HashMap<u64, Listener>>>,
    event: &str,
    snapshot: &BehaviorSnapshot,
) {
    for listener in listeners.lock().values() {
        listener(event, snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    const PAGE: &str = r#"
    <html><body>
      <section id="pricing"><h2>Pricing</h2><div>$49/mo plans here</div></section>
      <section id="features"><h2>Features</h2><p>Things we do well, described.</p></section>
      <a class="btn btn-primary" href="/signup">Get Started</a>
      <a href="/blog">Blog</a>
    </body></html>
    "#;

    fn setup() -> (Arc<PageDocument>, Arc<BehaviorTracker>) {
        let doc = Arc::new(PageDocument::from_html("https://acme.dev", PAGE));
        let tracker = BehaviorTracker::new(Arc::clone(&doc));
        (doc, tracker)
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_is_idempotent() {
        let (_doc, tracker) = setup();
        tracker.init();
        tracker.init();
        tokio::time::advance(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        // a double init must not double-count time
        assert_eq!(tracker.snapshot().time_on_page_secs, 3);
        tracker.teardown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_updates_max_depth() {
        let (_doc, tracker) = setup();
        tracker.handle_event(BehaviorEvent::Scroll { depth: 0.5 });
        tracker.handle_event(BehaviorEvent::Scroll { depth: 0.2 });
        let snapshot = tracker.snapshot();
        assert!((snapshot.max_scroll_depth - 0.5).abs() < f64::EPSILON);
        assert!((snapshot.scroll_depth - 0.2).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cta_classification() {
        let (doc, tracker) = setup();
        let nodes = doc.visible_nodes();
        let cta = nodes
            .iter()
            .find(|id| doc.text_content(**id) == "Get Started")
            .copied()
            .unwrap();
        let blog = nodes
            .iter()
            .find(|id| doc.text_content(**id) == "Blog")
            .copied()
            .unwrap();

        tracker.handle_event(BehaviorEvent::Hover { node: cta });
        tracker.handle_event(BehaviorEvent::Hover { node: blog });
        tracker.handle_event(BehaviorEvent::Click { node: cta });

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.cta_hovered, 1);
        assert_eq!(snapshot.cta_clicked, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_intent() {
        let (_doc, tracker) = setup();
        tracker.handle_event(BehaviorEvent::PointerLeave { client_y: 300.0 });
        assert!(!tracker.snapshot().exit_intent_detected);
        tracker.handle_event(BehaviorEvent::PointerLeave { client_y: -1.0 });
        assert!(tracker.snapshot().exit_intent_detected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_section_visibility_on_scroll() {
        let (_doc, tracker) = setup();
        // pricing sits near the top of the synthetic layout
        tracker.handle_event(BehaviorEvent::Scroll { depth: 0.0 });
        let snapshot = tracker.snapshot();
        assert!(snapshot.pricing_viewed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listeners_receive_snapshots() {
        let (_doc, tracker) = setup();
        let seen = Arc::new(AtomicU32::new(0));
        let seen_clone = Arc::clone(&seen);
        let id = tracker.add_listener(Box::new(move |event, snapshot| {
            if event == "message_sent" {
                assert_eq!(snapshot.messages_sent, 1);
                seen_clone.fetch_add(1, Ordering::SeqCst);
            }
        }));
        tracker.handle_event(BehaviorEvent::MessageSent);
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        tracker.remove_listener(id);
        tracker.handle_event(BehaviorEvent::MessageSent);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
