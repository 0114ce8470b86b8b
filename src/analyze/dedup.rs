// src/analyze/dedup.rs
//! Near-duplicate removal over one batch of headlines.
//!
//! Every pair `(i, j)` with `i < j` whose TF-IDF cosine similarity exceeds the
//! threshold marks `j` for removal. Removal depends on index order only: the
//! earliest item of a similar cluster always survives, and items marked by an
//! earlier one are dropped even if they are only similar to each other.

use std::collections::HashSet;

use super::tfidf::TfIdfMatrix;

pub const DEFAULT_DEDUP_THRESHOLD: f64 = 0.7;

/// Anything with a title can be de-duplicated.
pub trait HasTitle {
    fn title(&self) -> &str;
}

impl HasTitle for crate::ingest::types::Headline {
    fn title(&self) -> &str {
        &self.title
    }
}

impl HasTitle for String {
    fn title(&self) -> &str {
        self
    }
}

/// Indices (ascending) that would be removed from `titles`.
pub fn duplicate_indices<S: AsRef<str>>(titles: &[S], threshold: f64) -> Vec<usize> {
    if titles.len() < 2 {
        return Vec::new();
    }
    let matrix = TfIdfMatrix::fit_transform(titles);
    let n = titles.len();
    let mut marked: HashSet<usize> = HashSet::new();
    for i in 0..n {
        for j in (i + 1)..n {
            if matrix.similarity(i, j) > threshold {
                marked.insert(j);
            }
        }
    }
    let mut out: Vec<usize> = marked.into_iter().collect();
    out.sort_unstable();
    out
}

/// Drop near-duplicates, keeping the survivors in their original order.
pub fn deduplicate<T: HasTitle>(items: Vec<T>, threshold: f64) -> Vec<T> {
    let titles: Vec<&str> = items.iter().map(HasTitle::title).collect();
    let removed: HashSet<usize> = duplicate_indices(&titles, threshold).into_iter().collect();
    if removed.is_empty() {
        return items;
    }
    items
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !removed.contains(idx))
        .map(|(_, it)| it)
        .collect()
}

/// Pairwise similarity matrix for a batch of titles (diagnostics).
pub fn similarity_matrix<S: AsRef<str>>(titles: &[S]) -> Vec<Vec<f64>> {
    TfIdfMatrix::fit_transform(titles).similarity_matrix()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_and_single_are_noops() {
        let empty: Vec<String> = vec![];
        assert!(deduplicate(empty, 0.7).is_empty());
        let one = strings(&["only headline"]);
        assert_eq!(deduplicate(one.clone(), 0.7), one);
    }

    #[test]
    fn mutually_similar_triple_keeps_first() {
        let batch = strings(&[
            "Bitcoin hits new record high",
            "Bitcoin hits new record high again",
            "bitcoin hits record high",
        ]);
        let sim = similarity_matrix(&batch);
        assert!(sim[0][1] > 0.7 && sim[0][2] > 0.7 && sim[1][2] > 0.7);
        assert_eq!(deduplicate(batch.clone(), 0.7), vec![batch[0].clone()]);
    }

    #[test]
    fn dissimilar_batch_is_unchanged() {
        let batch = strings(&[
            "Bitcoin hits new record high",
            "Local bakery wins award",
            "Cricket world cup final tonight",
        ]);
        assert_eq!(deduplicate(batch.clone(), 0.7), batch);
    }

    #[test]
    fn identical_titles_collapse_to_first() {
        let batch = strings(&["Same story", "Same story", "Same story"]);
        assert_eq!(deduplicate(batch, 0.7), strings(&["Same story"]));
    }

    #[test]
    fn stop_word_only_titles_are_kept() {
        let batch = strings(&["the", "of the", "!!"]);
        assert_eq!(deduplicate(batch.clone(), 0.7), batch);
    }

    #[test]
    fn chain_removal_follows_index_order() {
        // 0~1 and 1~2 are similar, 0 and 2 are not. Index 1 is marked by 0,
        // and 2 is still marked by 1 even though 1 itself is going away.
        let batch = strings(&[
            "alpha beta gamma delta",
            "alpha beta gamma delta epsilon zeta",
            "gamma delta epsilon zeta",
        ]);
        let sim = similarity_matrix(&batch);
        assert!(sim[0][1] > 0.7);
        assert!(sim[1][2] > 0.7);
        assert!(sim[0][2] <= 0.7);
        assert_eq!(duplicate_indices(&batch, 0.7), vec![1, 2]);
    }
}
