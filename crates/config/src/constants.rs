//! Timing and sizing constants shared across the SDK

/// Content cache
pub mod cache {
    use std::time::Duration;

    /// Snapshot time-to-live
    pub const TTL: Duration = Duration::from_secs(5 * 60);
    /// Debounce window between a qualifying mutation and the cache flush
    pub const MUTATION_DEBOUNCE: Duration = Duration::from_secs(1);
    /// Periodic sweep interval for expired entries
    pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
    /// Character-data mutations shorter than this are ignored
    pub const MIN_TEXT_MUTATION_LEN: usize = 10;
}

/// Page extraction
pub mod extract {
    use std::time::Duration;

    /// Soft budget; extraction returns what it has past this deadline
    pub const SOFT_BUDGET: Duration = Duration::from_millis(200);

    pub const MAX_PRICING_FEATURES: usize = 15;
    pub const MAX_FAQS: usize = 20;
    pub const MAX_PRODUCTS: usize = 20;
    pub const MAX_CTAS: usize = 10;
    pub const MAX_KEYWORDS: usize = 15;
    pub const MAX_SUMMARY_CHARS: usize = 200;
    pub const MAX_FEATURE_NAME_CHARS: usize = 100;
    pub const MAX_FEATURE_DESC_CHARS: usize = 200;
    pub const MAX_FAQ_ANSWER_CHARS: usize = 300;
}

/// Action executor effects
pub mod actions {
    use std::time::Duration;

    pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(2000);
    pub const PULSE_DURATION: Duration = Duration::from_millis(3000);
    pub const COMPARE_DURATION: Duration = Duration::from_millis(3000);
    pub const FOCUS_DURATION: Duration = Duration::from_millis(2500);
    /// Delay before the focus glow is applied, after scrolling
    pub const FOCUS_SETTLE: Duration = Duration::from_millis(600);
    /// Delay between scrolling to a clickable element and clicking it
    pub const CLICK_SETTLE: Duration = Duration::from_millis(500);
    /// No visual effect may outlive this bound
    pub const MAX_EFFECT_DURATION: Duration = Duration::from_secs(10);
    /// Gap between actions of a multi-step plan
    pub const INTER_ACTION_DELAY: Duration = Duration::from_millis(400);
}

/// Voice pipeline
pub mod voice {
    use std::time::Duration;

    /// End-of-turn silence window after a final recognition segment
    pub const DEFAULT_SILENCE_THRESHOLD: Duration = Duration::from_millis(800);
    /// Recognizer restart delay after playback completes
    pub const RECOGNIZER_RESTART_DELAY: Duration = Duration::from_millis(300);
    /// Error state recovers to listening after this long
    pub const ERROR_RECOVERY_DELAY: Duration = Duration::from_secs(2);
    /// Minimum lead time when scheduling a freshly decoded chunk
    pub const SCHEDULE_LEAD: Duration = Duration::from_millis(50);
    /// WebSocket reconnect attempts before giving up
    pub const MAX_RECONNECT_ATTEMPTS: u32 = 3;
    pub const RECONNECT_DELAY: Duration = Duration::from_secs(2);
    /// Negotiated PCM sample rate
    pub const SAMPLE_RATE: u32 = 44_100;
    /// RIFF WAV header length stripped from the first chunk of a stream
    pub const WAV_HEADER_LEN: usize = 44;
}

/// Shell / UI
pub mod shell {
    use std::time::Duration;

    /// Close debounce after the pointer leaves the shell
    pub const CLOSE_DEBOUNCE: Duration = Duration::from_millis(150);
    /// Engagement trigger evaluation tick
    pub const TRIGGER_TICK: Duration = Duration::from_secs(5);
    /// Key written to host storage after the first visit
    pub const VISITED_KEY: &str = "blitsum_visited";
}
