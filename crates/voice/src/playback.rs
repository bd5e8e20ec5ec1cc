//! Gapless playback scheduling
//!
//! Maintains the `next_play_time` cursor: each decoded chunk is scheduled
//! at `max(cursor, now + lead)` and the cursor advances by the buffer
//! duration, so consecutive buffers start exactly when the prior one ends.
//! Live sources are tracked in a set; observers are notified when a source
//! ends so the joint completion predicate can be re-checked. Flushing stops
//! every source and resets the cursor to the current clock.

use blitsum_config::constants::voice::SCHEDULE_LEAD;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;

struct Inner {
    next_play_time: Instant,
    active: HashMap<u64, JoinHandle<()>>,
    next_source: u64,
}

/// Schedules decoded audio buffers back to back
pub struct PlaybackScheduler {
    sample_rate: u32,
    inner: Arc<Mutex<Inner>>,
    changed: Arc<Notify>,
}

impl PlaybackScheduler {
    pub fn new(sample_rate: u32) -> Arc<Self> {
        Arc::new(Self {
            sample_rate,
            inner: Arc::new(Mutex::new(Inner {
                next_play_time: Instant::now(),
                active: HashMap::new(),
                next_source: 0,
            })),
            changed: Arc::new(Notify::new()),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Notified whenever a source ends or the set is flushed
    pub fn changes(&self) -> Arc<Notify> {
        Arc::clone(&self.changed)
    }

    /// Schedule a buffer; returns its source id. Empty buffers are ignored.
    pub fn schedule(&self, samples: Vec<f32>) -> Option<u64> {
        if samples.is_empty() {
            return None;
        }
        let duration = crate::audio::buffer_duration(samples.len(), self.sample_rate);
        let now = Instant::now();

        let mut inner = self.inner.lock();
        let start = inner.next_play_time.max(now + SCHEDULE_LEAD);
        inner.next_play_time = start + duration;
        let source_id = inner.next_source;
        inner.next_source += 1;

        let ends_at = start + duration;
        let task_inner = Arc::clone(&self.inner);
        let task_changed = Arc::clone(&self.changed);
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(ends_at).await;
            task_inner.lock().active.remove(&source_id);
            task_changed.notify_waiters();
        });
        inner.active.insert(source_id, handle);
        Some(source_id)
    }

    /// Number of sources still scheduled or playing
    pub fn active_sources(&self) -> usize {
        self.inner.lock().active.len()
    }

    /// Current cursor position relative to now, for tests and diagnostics
    pub fn lead_time(&self) -> std::time::Duration {
        let inner = self.inner.lock();
        inner
            .next_play_time
            .saturating_duration_since(Instant::now())
    }

    /// Stop all active sources, clear the set and reset the cursor to the
    /// current audio-clock time
    pub fn flush(&self) {
        let mut inner = self.inner.lock();
        for (_, handle) in inner.active.drain() {
            handle.abort();
        }
        inner.next_play_time = Instant::now();
        drop(inner);
        self.changed.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn samples_for(duration: Duration, rate: u32) -> Vec<f32> {
        vec![0.0; (duration.as_secs_f64() * rate as f64) as usize]
    }

    #[tokio::test(start_paused = true)]
    async fn test_buffers_scheduled_back_to_back() {
        let scheduler = PlaybackScheduler::new(44_100);
        scheduler.schedule(samples_for(Duration::from_millis(500), 44_100));
        scheduler.schedule(samples_for(Duration::from_millis(500), 44_100));
        assert_eq!(scheduler.active_sources(), 2);

        // cursor sits at lead + 1s of audio
        let lead = scheduler.lead_time();
        assert!(lead >= Duration::from_millis(1000));
        assert!(lead <= Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sources_end_in_order() {
        let scheduler = PlaybackScheduler::new(44_100);
        scheduler.schedule(samples_for(Duration::from_millis(200), 44_100));
        scheduler.schedule(samples_for(Duration::from_millis(200), 44_100));

        tokio::time::advance(Duration::from_millis(300)).await;
        tokio::task::yield_now().await;
        assert_eq!(scheduler.active_sources(), 1);

        tokio::time::advance(Duration::from_millis(250)).await;
        tokio::task::yield_now().await;
        assert_eq!(scheduler.active_sources(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_clears_and_resets_cursor() {
        let scheduler = PlaybackScheduler::new(44_100);
        scheduler.schedule(samples_for(Duration::from_secs(2), 44_100));
        assert_eq!(scheduler.active_sources(), 1);

        scheduler.flush();
        assert_eq!(scheduler.active_sources(), 0);
        assert_eq!(scheduler.lead_time(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_notification_on_end() {
        let scheduler = PlaybackScheduler::new(44_100);
        let changes = scheduler.changes();
        scheduler.schedule(samples_for(Duration::from_millis(100), 44_100));

        let waiter = tokio::spawn(async move { changes.notified().await });
        tokio::time::advance(Duration::from_millis(200)).await;
        waiter.await.unwrap();
        assert_eq!(scheduler.active_sources(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_buffer_ignored() {
        let scheduler = PlaybackScheduler::new(44_100);
        assert!(scheduler.schedule(Vec::new()).is_none());
        assert_eq!(scheduler.active_sources(), 0);
    }
}
