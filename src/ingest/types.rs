// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One headline as a source hands it over, before scoring.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq, Default)]
pub struct RawHeadline {
    pub title: String,
    pub link: String,
    pub source: String, // e.g., "Google News", "Hacker News"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upvotes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
}

impl RawHeadline {
    pub fn new(title: impl Into<String>, link: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            source: source.into(),
            ..Default::default()
        }
    }
}

/// A scored + classified candidate. Once published it is never mutated;
/// the cache swaps whole lists instead.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Headline {
    pub title: String,
    pub link: String,
    pub source: String,
    pub score: i64,
    pub category: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upvotes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub views: Option<u64>,
}

impl Headline {
    /// Score and classify a raw item, stamping it with `now`.
    pub fn from_raw(raw: RawHeadline, now: DateTime<Utc>) -> Self {
        let score = crate::analyze::score_headline(&raw.title, raw.upvotes, raw.comments, raw.views);
        let category = crate::analyze::classify_category(&raw.title).to_string();
        Self {
            title: raw.title,
            link: raw.link,
            source: raw.source,
            score,
            category,
            timestamp: now,
            upvotes: raw.upvotes,
            comments: raw.comments,
            views: raw.views,
        }
    }
}

/// Row persisted to the append-only headline log.
/// Score and timestamp stay in memory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub title: String,
    pub category: String,
    pub source: String,
}

impl From<&Headline> for LogRecord {
    fn from(h: &Headline) -> Self {
        Self {
            title: h.title.clone(),
            category: h.category.clone(),
            source: h.source.clone(),
        }
    }
}

#[async_trait::async_trait]
pub trait SourceProvider: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawHeadline>>;
    fn name(&self) -> &str;
}
