//! Content cache
//!
//! TTL map over extracted page contexts, keyed by URL plus a fast content
//! hash. Reads self-evict expired entries; a watcher task flushes the whole
//! cache one debounce window after any significant host-document mutation,
//! and a periodic sweep evicts expired entries. Mutations originating under
//! the SDK shell never flush.

use crate::document::{MutationEvent, MutationKind, PageDocument};
use blitsum_config::constants::cache as cache_consts;
use blitsum_core::PageContext;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

struct CacheEntry {
    context: Arc<PageContext>,
    inserted: Instant,
}

/// TTL cache for page contexts
pub struct ContentCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::with_ttl(cache_consts::TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Cache key for a document: `content:<url>:<contentHash>`
    pub fn key_for(doc: &PageDocument) -> String {
        format!("content:{}:{:08x}", doc.url(), doc.content_hash())
    }

    /// Cache key without a hash component
    pub fn key_for_url(url: &str) -> String {
        format!("content:{url}")
    }

    /// Read an entry; expired entries are evicted and yield `None`
    pub fn get(&self, key: &str) -> Option<Arc<PageContext>> {
        let expired = {
            let entry = self.entries.get(key)?;
            if entry.inserted.elapsed() > self.ttl {
                true
            } else {
                return Some(Arc::clone(&entry.context));
            }
        };
        if expired {
            self.entries.remove(key);
        }
        None
    }

    pub fn set(&self, key: impl Into<String>, context: PageContext) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                context: Arc::new(context),
                inserted: Instant::now(),
            },
        );
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Evict expired entries
    pub fn sweep(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.inserted.elapsed() <= ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn mutation_qualifies(event: &MutationEvent) -> bool {
        if event.in_sdk_shell {
            return false;
        }
        match event.kind {
            MutationKind::ChildList => true,
            MutationKind::CharacterData { text_len } => {
                text_len > cache_consts::MIN_TEXT_MUTATION_LEN
            }
        }
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to the cache's watcher and sweeper tasks; aborts them on drop
pub struct CacheWatch {
    watcher: JoinHandle<()>,
    sweeper: JoinHandle<()>,
}

impl Drop for CacheWatch {
    fn drop(&mut self) {
        self.watcher.abort();
        self.sweeper.abort();
    }
}

impl ContentCache {
    /// Start watching a document for significant mutations, and sweep
    /// expired entries periodically. Flushes the whole cache one debounce
    /// window after the last qualifying mutation.
    pub fn watch(cache: Arc<Self>, doc: &PageDocument) -> CacheWatch {
        let mut rx = doc.subscribe_mutations();
        let watch_cache = Arc::clone(&cache);
        let watcher = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) if Self::mutation_qualifies(&event) => {
                        // trailing-edge debounce: absorb churn, then flush once
                        loop {
                            match tokio::time::timeout(cache_consts::MUTATION_DEBOUNCE, rx.recv())
                                .await
                            {
                                Ok(Ok(_)) => continue,
                                Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
                                Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => break,
                            }
                        }
                        tracing::debug!("host document mutated, flushing content cache");
                        watch_cache.clear();
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "mutation stream lagged, flushing cache");
                        watch_cache.clear();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let sweep_cache = Arc::clone(&cache);
        let sweeper = tokio::spawn(async move {
            let mut tick = tokio::time::interval(cache_consts::SWEEP_INTERVAL);
            tick.tick().await;
            loop {
                tick.tick().await;
                sweep_cache.sweep();
            }
        });

        CacheWatch { watcher, sweeper }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> PageContext {
        PageContext::empty("https://acme.dev")
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_before_and_after_ttl() {
        let cache = ContentCache::with_ttl(Duration::from_secs(10));
        cache.set("content:a", context());
        assert!(cache.get("content:a").is_some());

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(cache.get("content:a").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_evicts_expired() {
        let cache = ContentCache::with_ttl(Duration::from_secs(10));
        cache.set("content:a", context());
        cache.set("content:b", context());
        tokio::time::advance(Duration::from_secs(11)).await;
        cache.sweep();
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_flushes_after_debounce() {
        let doc = PageDocument::from_html(
            "https://acme.dev",
            "<html><body><main>original content here</main></body></html>",
        );
        let cache = Arc::new(ContentCache::new());
        let _watch = ContentCache::watch(Arc::clone(&cache), &doc);
        tokio::task::yield_now().await;

        cache.set(ContentCache::key_for(&doc), context());
        doc.replace_html("<html><body><main>replaced wholesale</main></body></html>");

        tokio::time::advance(Duration::from_millis(1200)).await;
        tokio::task::yield_now().await;
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shell_mutations_do_not_flush() {
        let doc = PageDocument::from_html(
            "https://acme.dev",
            "<html><body><main>content</main></body></html>",
        );
        doc.mount_sdk_root();
        let cache = Arc::new(ContentCache::new());
        let _watch = ContentCache::watch(Arc::clone(&cache), &doc);
        tokio::task::yield_now().await;

        cache.set("content:x", context());
        doc.append_shell_text("assistant bubble that is fairly long");

        tokio::time::advance(Duration::from_millis(1500)).await;
        tokio::task::yield_now().await;
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_text_mutation_ignored() {
        let doc = PageDocument::from_html(
            "https://acme.dev",
            "<html><body><p id='x'>hello there world</p></body></html>",
        );
        let node = doc.visible_nodes()[0];
        let cache = Arc::new(ContentCache::new());
        let _watch = ContentCache::watch(Arc::clone(&cache), &doc);
        tokio::task::yield_now().await;

        cache.set("content:x", context());
        doc.set_text(node, "tiny");

        tokio::time::advance(Duration::from_millis(1500)).await;
        tokio::task::yield_now().await;
        assert_eq!(cache.len(), 1);
    }
}
