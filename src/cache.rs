// src/cache.rs
//! Published headline list shared between the cycle loop and the API.
//!
//! Writers swap in a whole new `Arc<Vec<_>>`; readers load a snapshot and
//! never block. The admin reset goes through the same swap.

use arc_swap::ArcSwap;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::error::PulseError;
use crate::ingest::types::Headline;

#[derive(Default)]
pub struct PublishedCache {
    inner: ArcSwap<Vec<Headline>>,
}

impl PublishedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current list, ordered by score descending.
    pub fn snapshot(&self) -> Arc<Vec<Headline>> {
        self.inner.load_full()
    }

    pub fn replace(&self, items: Vec<Headline>) {
        let n = items.len();
        self.inner.store(Arc::new(items));
        metrics::gauge!("pulse_cache_size").set(n as f64);
    }

    pub fn clear(&self) {
        self.replace(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// First 12 hex chars of SHA-256; safe to write to logs.
pub fn key_fingerprint(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Guards the privileged cache reset.
#[derive(Clone)]
pub struct AdminAccess {
    api_key: String,
}

impl std::fmt::Debug for AdminAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAccess")
            .field("api_key", &key_fingerprint(&self.api_key))
            .finish()
    }
}

impl AdminAccess {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Exact string comparison against the configured secret.
    pub fn check(&self, credential: Option<&str>) -> Result<(), PulseError> {
        match credential {
            None => Err(PulseError::MissingCredential),
            Some(c) if c == self.api_key => Ok(()),
            Some(c) => {
                tracing::warn!(
                    target: "api",
                    key_fingerprint = %key_fingerprint(c),
                    "rejected admin credential"
                );
                Err(PulseError::Forbidden)
            }
        }
    }

    pub fn clear_cache(&self, cache: &PublishedCache, credential: &str) -> Result<(), PulseError> {
        self.check(Some(credential))?;
        cache.clear();
        tracing::info!(target: "api", "published cache cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn headline(title: &str, score: i64) -> Headline {
        Headline {
            title: title.into(),
            link: format!("https://example.com/{score}"),
            source: "test".into(),
            score,
            category: "General".into(),
            timestamp: Utc::now(),
            upvotes: None,
            comments: None,
            views: None,
        }
    }

    #[test]
    fn snapshot_outlives_replace() {
        let cache = PublishedCache::new();
        cache.replace(vec![headline("old", 1)]);
        let before = cache.snapshot();
        cache.replace(vec![headline("new a", 3), headline("new b", 2)]);
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].title, "old");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn wrong_key_is_forbidden_and_keeps_cache() {
        let cache = PublishedCache::new();
        cache.replace(vec![headline("x", 1)]);
        let admin = AdminAccess::new("s3cret");
        assert_eq!(admin.clear_cache(&cache, "S3CRET"), Err(PulseError::Forbidden));
        assert_eq!(cache.len(), 1);
        assert_eq!(admin.clear_cache(&cache, "s3cret"), Ok(()));
        assert!(cache.is_empty());
    }

    #[test]
    fn missing_credential_is_distinct() {
        let admin = AdminAccess::new("k");
        assert_eq!(admin.check(None), Err(PulseError::MissingCredential));
    }

    #[test]
    fn fingerprint_is_short_hex_and_hides_key() {
        let fp = key_fingerprint("hunter2");
        assert_eq!(fp.len(), 12);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!fp.contains("hunter2"));
        assert_eq!(fp, key_fingerprint("hunter2"));
        assert!(!format!("{:?}", AdminAccess::new("hunter2")).contains("hunter2"));
    }
}
