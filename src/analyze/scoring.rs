//! Headline scoring: an additive point system with no normalization.
//!
//! - urgency keywords: +10 per keyword present
//! - length: +3 above 80 chars, -2 below 30 chars (raw title, char count)
//! - important entities: +5 per list entry present (substring, not whole word)
//! - trailing `?`: +2
//! - engagement: capped buckets for upvotes / comments / views
//!
//! The result has no upper bound and may be negative.

/// Terms that mark a headline as urgent.
pub const URGENCY_KEYWORDS: &[&str] = &[
    "breaking",
    "trending",
    "just in",
    "alert",
    "hot take",
    "exclusive",
];

/// Entities that make a headline more interesting. "usa" is listed twice,
/// so a hit on it is worth double.
pub const IMPORTANT_ENTITIES: &[&str] = &[
    "elon", "ai", "india", "musk", "china", "usa", "bitcoin", "usa",
];

const KEYWORD_POINTS: i64 = 10;
const ENTITY_POINTS: i64 = 5;
const QUESTION_POINTS: i64 = 2;
const LONG_TITLE_CHARS: usize = 80;
const SHORT_TITLE_CHARS: usize = 30;

/// Score one headline. Engagement metrics count only when present and
/// non-zero, so `Some(0)` scores exactly like `None`.
pub fn score_headline(
    title: &str,
    upvotes: Option<u64>,
    comments: Option<u64>,
    views: Option<u64>,
) -> i64 {
    let lower = title.to_lowercase();
    let mut score = 0i64;

    for kw in URGENCY_KEYWORDS {
        if lower.contains(kw) {
            score += KEYWORD_POINTS;
        }
    }

    // Thresholds apply to the original-case title.
    let len = title.chars().count();
    if len > LONG_TITLE_CHARS {
        score += 3;
    } else if len < SHORT_TITLE_CHARS {
        score -= 2;
    }

    for entity in IMPORTANT_ENTITIES {
        if lower.contains(entity) {
            score += ENTITY_POINTS;
        }
    }

    if title.ends_with('?') {
        score += QUESTION_POINTS;
    }

    score += engagement(upvotes, 50, 10);
    score += engagement(comments, 10, 5);
    score += engagement(views, 1000, 5);

    score
}

fn engagement(metric: Option<u64>, bucket: u64, cap: u64) -> i64 {
    match metric {
        Some(v) if v > 0 => (v / bucket).min(cap) as i64,
        _ => 0,
    }
}
