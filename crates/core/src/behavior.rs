//! Behavior snapshot collected by the tracker
//!
//! Mutated only by the behavior tracker; every other component reads copies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of visitor behavior on the host page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorSnapshot {
    /// Seconds since the session started
    pub time_on_page_secs: u64,
    /// Current scroll depth as a fraction of the document, 0.0..=1.0
    pub scroll_depth: f64,
    /// Deepest scroll reached this session (monotonically increasing)
    pub max_scroll_depth: f64,
    pub pricing_viewed: bool,
    pub features_viewed: bool,
    pub cta_hovered: u32,
    pub cta_clicked: u32,
    pub mouse_movements: u64,
    pub exit_intent_detected: bool,
    /// Number of times the visitor compared plans
    pub plan_comparisons: u32,
    /// Chat messages sent this session
    pub messages_sent: u32,
    pub last_activity: DateTime<Utc>,
    pub session_start: DateTime<Utc>,
}

impl BehaviorSnapshot {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            time_on_page_secs: 0,
            scroll_depth: 0.0,
            max_scroll_depth: 0.0,
            pricing_viewed: false,
            features_viewed: false,
            cta_hovered: 0,
            cta_clicked: 0,
            mouse_movements: 0,
            exit_intent_detected: false,
            plan_comparisons: 0,
            messages_sent: 0,
            last_activity: now,
            session_start: now,
        }
    }

    /// Record a scroll position; max depth only ever grows
    pub fn record_scroll(&mut self, depth: f64) {
        let depth = depth.clamp(0.0, 1.0);
        self.scroll_depth = depth;
        if depth > self.max_scroll_depth {
            self.max_scroll_depth = depth;
        }
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Engaged visitors have scrolled meaningfully or interacted with a CTA
    pub fn is_engaged(&self) -> bool {
        self.max_scroll_depth > 0.3 || self.cta_hovered > 0 || self.messages_sent > 0
    }
}

impl Default for BehaviorSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
