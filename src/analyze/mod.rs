// src/analyze/mod.rs
//! Headline analysis: scoring, classification and near-duplicate removal.

pub mod classify;
pub mod dedup;
pub mod scoring;
pub mod tfidf;

pub use crate::analyze::classify::{classify_category, GENERAL};
pub use crate::analyze::dedup::{deduplicate, DEFAULT_DEDUP_THRESHOLD};
pub use crate::analyze::scoring::score_headline;

use crate::ingest::types::Headline;

/// Stable sort, highest score first. Ties keep their incoming order.
pub fn sort_by_score_desc(items: &mut [Headline]) {
    items.sort_by(|a, b| b.score.cmp(&a.score));
}
