// src/ingest/providers/mod.rs
pub mod hackernews;
pub mod rss;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{SourceConfig, SourceKind};
use crate::ingest::cache::CachedProvider;
use crate::ingest::http::PoliteClient;
use crate::ingest::types::SourceProvider;

use self::hackernews::HackerNewsProvider;
use self::rss::RssProvider;

/// Build one cached provider per configured source, in config order
/// (which is also the order results are concatenated in).
pub fn build_sources(sources: &[SourceConfig], client: &PoliteClient) -> Vec<Arc<dyn SourceProvider>> {
    sources
        .iter()
        .map(|s| {
            let ttl = Duration::from_secs(s.cache_ttl_secs);
            let provider: Arc<dyn SourceProvider> = match s.kind {
                SourceKind::Rss => Arc::new(CachedProvider::new(
                    RssProvider::from_url(&s.name, &s.url, client.clone())
                        .with_allowed_domains(s.allowed_domains.clone())
                        .with_max_items(s.max_items)
                        .with_robots(s.robots),
                    ttl,
                )),
                SourceKind::Hackernews => Arc::new(CachedProvider::new(
                    HackerNewsProvider::from_url(&s.url, client.clone())
                        .with_max_items(s.max_items)
                        .with_robots(s.robots),
                    ttl,
                )),
            };
            tracing::info!(target: "ingest", source = %s.name, url = %s.url, ttl_secs = s.cache_ttl_secs, "source registered");
            provider
        })
        .collect()
}
