// src/analyze/classify.rs
//! Rule-based topical classifier.
//!
//! Each category sums the occurrence counts of its keywords in the lowercased
//! title (substring matches, so "usa" also fires inside "usain"). The highest
//! total wins; ties go to the category listed first in [`PRIORITY`].

/// Returned when no category keyword matches.
pub const GENERAL: &str = "General";

/// Tie-break order, most specific first.
pub const PRIORITY: &[&str] = &[
    "Sports",
    "Politics",
    "Technology",
    "Finance",
    "World",
    "Health",
    "Entertainment",
];

/// Category keyword table (lowercase).
pub const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Politics",
        &[
            "election",
            "president",
            "prime minister",
            "parliament",
            "government",
            "bjp",
            "congress",
            "modi",
            "biden",
        ],
    ),
    (
        "Technology",
        &[
            "tech", "ai", "software", "robot", "startup", "elon", "musk", "chatgpt", "openai",
            "spacex",
        ],
    ),
    (
        "Health",
        &["covid", "health", "virus", "hospital", "vaccine", "disease", "flu"],
    ),
    (
        "Finance",
        &[
            "stock",
            "inflation",
            "economy",
            "market",
            "crypto",
            "bitcoin",
            "bank",
            "recession",
        ],
    ),
    (
        "World",
        &["war", "iran", "russia", "china", "usa", "diplomacy", "israel"],
    ),
    (
        "Entertainment",
        &[
            "movie",
            "film",
            "celebrity",
            "actor",
            "bollywood",
            "tv",
            "series",
            "music",
            "festival",
        ],
    ),
    (
        "Sports",
        &[
            "football",
            "cricket",
            "tournament",
            "match",
            "goal",
            "win",
            "cup",
            "olympics",
        ],
    ),
];

/// Per-category keyword hit counts, in table order.
pub fn category_scores(title: &str) -> Vec<(&'static str, usize)> {
    let lower = title.to_lowercase();
    CATEGORIES
        .iter()
        .map(|(cat, keywords)| {
            let hits = keywords.iter().map(|k| lower.matches(k).count()).sum();
            (*cat, hits)
        })
        .collect()
}

fn priority_rank(category: &str) -> usize {
    PRIORITY
        .iter()
        .position(|p| *p == category)
        .unwrap_or(usize::MAX)
}

/// Assign a category label to a headline.
pub fn classify_category(title: &str) -> &'static str {
    let scores = category_scores(title);
    scores
        .into_iter()
        .filter(|(_, hits)| *hits > 0)
        .min_by_key(|(cat, hits)| (std::cmp::Reverse(*hits), priority_rank(cat)))
        .map(|(cat, _)| cat)
        .unwrap_or(GENERAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits_for(title: &str, category: &str) -> usize {
        category_scores(title)
            .into_iter()
            .find(|(c, _)| *c == category)
            .map(|(_, n)| n)
            .unwrap_or(0)
    }

    #[test]
    fn no_keywords_yields_general() {
        assert_eq!(classify_category("Local bakery bakes bread"), GENERAL);
        assert_eq!(classify_category(""), GENERAL);
    }

    #[test]
    fn sports_beats_politics_on_tie() {
        // one "election" vs one "cricket"
        assert_eq!(classify_category("Election day cricket"), "Sports");
    }

    #[test]
    fn repeated_occurrences_count_linearly() {
        assert_eq!(hits_for("usa usa usa", "World"), 3);
        assert_eq!(classify_category("usa usa usa"), "World");
    }

    #[test]
    fn substrings_inside_words_count() {
        // "usain" -> usa (World) and ai (Technology); tie resolved by priority
        assert_eq!(hits_for("Usain", "World"), 1);
        assert_eq!(hits_for("Usain", "Technology"), 1);
        assert_eq!(classify_category("Usain"), "Technology");
    }

    #[test]
    fn highest_count_wins_over_priority() {
        // Finance: stock + market (2) vs Sports: win (1)
        assert_eq!(classify_category("Stock market rally"), "Finance");
        assert_eq!(classify_category("Stock market win"), "Finance");
    }

    #[test]
    fn bitcoin_is_finance() {
        assert_eq!(classify_category("Breaking: Bitcoin hits new high"), "Finance");
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify_category("COVID vaccine rollout"), "Health");
    }
}
