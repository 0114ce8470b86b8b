// src/ingest/cache.rs
//! Per-source response cache. Each wrapped provider owns its cache, so
//! every source has its own expiry and size policy.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::types::{RawHeadline, SourceProvider};

pub const DEFAULT_MAX_ITEMS: usize = 100;

/// Single-slot cache with absolute TTL (no sliding refresh).
#[derive(Debug)]
pub struct TtlCache {
    ttl: Duration,
    max_items: usize,
    slot: Mutex<Option<(Instant, Vec<RawHeadline>)>>,
}

impl TtlCache {
    pub fn new(ttl: Duration, max_items: usize) -> Self {
        Self {
            ttl,
            max_items,
            slot: Mutex::new(None),
        }
    }

    /// Fresh entry at `now`, if any.
    pub fn get_at(&self, now: Instant) -> Option<Vec<RawHeadline>> {
        let guard = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        match guard.as_ref() {
            Some((stored_at, items)) if now.saturating_duration_since(*stored_at) < self.ttl => {
                Some(items.clone())
            }
            _ => None,
        }
    }

    pub fn get(&self) -> Option<Vec<RawHeadline>> {
        self.get_at(Instant::now())
    }

    /// Store `items` (truncated to the size cap) as of `now`.
    pub fn put_at(&self, now: Instant, mut items: Vec<RawHeadline>) {
        items.truncate(self.max_items);
        let mut guard = self.slot.lock().unwrap_or_else(|p| p.into_inner());
        *guard = Some((now, items));
    }

    pub fn put(&self, items: Vec<RawHeadline>) {
        self.put_at(Instant::now(), items)
    }
}

/// Wraps a provider with its own [`TtlCache`]. Only successful fetches are cached.
pub struct CachedProvider<P> {
    inner: P,
    cache: TtlCache,
}

impl<P: SourceProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self::with_cache(inner, TtlCache::new(ttl, DEFAULT_MAX_ITEMS))
    }

    pub fn with_cache(inner: P, cache: TtlCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }
}

#[async_trait]
impl<P: SourceProvider> SourceProvider for CachedProvider<P> {
    async fn fetch_latest(&self) -> Result<Vec<RawHeadline>> {
        if let Some(hit) = self.cache.get() {
            tracing::debug!(target: "ingest", source = self.inner.name(), items = hit.len(), "cache hit");
            return Ok(hit);
        }
        let fresh = self.inner.fetch_latest().await?;
        self.cache.put(fresh.clone());
        Ok(fresh)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SourceProvider for Counting {
        async fn fetch_latest(&self) -> Result<Vec<RawHeadline>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("boom");
            }
            Ok(vec![RawHeadline::new("t", "https://x", "Counting")])
        }
        fn name(&self) -> &str {
            "Counting"
        }
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = TtlCache::new(Duration::from_secs(300), 10);
        let t0 = Instant::now();
        cache.put_at(t0, vec![RawHeadline::new("a", "b", "c")]);
        assert!(cache.get_at(t0 + Duration::from_secs(299)).is_some());
        assert!(cache.get_at(t0 + Duration::from_secs(300)).is_none());
    }

    #[test]
    fn size_cap_truncates() {
        let cache = TtlCache::new(Duration::from_secs(60), 2);
        let items = (0..5)
            .map(|i| RawHeadline::new(format!("t{i}"), "l", "s"))
            .collect();
        cache.put(items);
        assert_eq!(cache.get().map(|v| v.len()), Some(2));
    }

    #[tokio::test]
    async fn cached_provider_hits_inner_once_within_ttl() {
        let p = CachedProvider::new(
            Counting {
                calls: AtomicUsize::new(0),
                fail: false,
            },
            Duration::from_secs(600),
        );
        p.fetch_latest().await.unwrap();
        p.fetch_latest().await.unwrap();
        assert_eq!(p.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let p = CachedProvider::new(
            Counting {
                calls: AtomicUsize::new(0),
                fail: true,
            },
            Duration::from_secs(600),
        );
        assert!(p.fetch_latest().await.is_err());
        assert!(p.fetch_latest().await.is_err());
        assert_eq!(p.inner.calls.load(Ordering::SeqCst), 2);
        assert!(p.cache().get().is_none());
    }
}
