//! Keyword-overlap retrieval.
//!
//! # Scoring
//!
//! 1. Lowercase the query and split it into a set of distinct words
//!    (see [`crate::chunk::words`]).
//! 2. Do the same for every candidate chunk.
//! 3. Score = size of the intersection of the two sets.
//! 4. Stable sort by score (desc), so ties keep document-then-chunk order.
//! 5. Truncate to `top_k`. Zero-score candidates are kept if they fit.
//!
//! There is no minimum score: with few chunks in the store, the best
//! available chunks are returned even when they share nothing with the query.

use std::collections::HashSet;

use crate::chunk::words;
use crate::models::{Document, RetrievalCandidate};

/// Default number of candidates handed to the composer.
pub const DEFAULT_TOP_K: usize = 3;

fn word_set(text: &str) -> HashSet<String> {
    words(&text.to_lowercase()).map(str::to_string).collect()
}

/// Count the distinct lowercase words `text` shares with `query_words`.
pub fn overlap_score(query_words: &HashSet<String>, text: &str) -> usize {
    word_set(text)
        .iter()
        .filter(|w| query_words.contains(*w))
        .count()
}

/// Rank every chunk of `documents` against `query` and keep the best `top_k`.
///
/// Candidates are enumerated document by document, chunk by chunk, in the
/// order given; that order breaks score ties.
pub fn rank<'a, I>(query: &str, documents: I, top_k: usize) -> Vec<RetrievalCandidate>
where
    I: IntoIterator<Item = &'a Document>,
{
    let query_words = word_set(query);

    let mut scored: Vec<(usize, &str, &str)> = documents
        .into_iter()
        .flat_map(|doc| {
            doc.chunks
                .iter()
                .map(move |chunk| (doc.filename.as_str(), chunk.as_str()))
        })
        .map(|(source, text)| (overlap_score(&query_words, text), source, text))
        .collect();

    // `sort_by` is stable; equal scores keep enumeration order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(top_k);

    scored
        .into_iter()
        .map(|(score, source, text)| RetrievalCandidate {
            text: text.to_string(),
            source: source.to_string(),
            score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(filename: &str, chunks: &[&str]) -> Document {
        Document {
            id: filename.to_string(),
            filename: filename.to_string(),
            content: chunks.join(" "),
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn score_counts_distinct_words_case_insensitively() {
        let q = word_set("Cats cats DO sleep");
        assert_eq!(q.len(), 3);
        assert_eq!(overlap_score(&q, "cats sleep cats sleep"), 2);
        assert_eq!(overlap_score(&q, "CATS Do Sleep"), 3);
        assert_eq!(overlap_score(&q, "dogs bark"), 0);
    }

    #[test]
    fn punctuation_is_part_of_the_word() {
        let q = word_set("what do cats do");
        assert_eq!(overlap_score(&q, "cats are small pets. cats sleep a lot."), 1);
        assert_eq!(overlap_score(&q, "lot."), 0);
    }

    #[test]
    fn information_separators_delimit_words() {
        let q = word_set("cats\u{1d}sleep");
        assert_eq!(q.len(), 2);
        assert_eq!(overlap_score(&q, "cats sleep"), 2);
    }

    #[test]
    fn orders_by_descending_score() {
        let docs = vec![
            doc("a.txt", &["nothing here"]),
            doc("b.txt", &["rust borrow checker", "rust"]),
        ];
        let results = rank("rust borrow checker", &docs, 3);
        let scores: Vec<usize> = results.iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![3, 1, 0]);
        assert_eq!(results[0].source, "b.txt");
        assert_eq!(results[2].source, "a.txt");
    }

    #[test]
    fn ties_keep_document_then_chunk_order() {
        let docs = vec![
            doc("a.txt", &["apple banana"]),
            doc("b.txt", &["banana cherry"]),
        ];
        let top = rank("banana", &docs, 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].source, "a.txt");
        assert_eq!(top[0].score, 1);

        let both = rank("banana", &docs, 2);
        assert_eq!(both[0].text, "apple banana");
        assert_eq!(both[1].text, "banana cherry");
    }

    #[test]
    fn zero_score_chunks_fill_the_window() {
        let docs = vec![doc("a.txt", &["alpha"]), doc("b.txt", &["beta"])];
        let results = rank("gamma", &docs, 3);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|c| c.score == 0));
    }

    #[test]
    fn top_k_bounds_result_length() {
        let docs = vec![
            doc("a.txt", &["one", "two", "three"]),
            doc("b.txt", &["four", "five"]),
        ];
        for k in 0..8 {
            assert_eq!(rank("one", &docs, k).len(), k.min(5));
        }
    }

    #[test]
    fn no_chunks_no_candidates() {
        let docs = vec![doc("empty.txt", &[])];
        assert!(rank("anything", &docs, 3).is_empty());
    }

    #[test]
    fn ranking_is_deterministic() {
        let docs = vec![
            doc("a.txt", &["x y", "y z", "z x"]),
            doc("b.txt", &["x", "y", "z"]),
        ];
        assert_eq!(rank("x y", &docs, 4), rank("x y", &docs, 4));
    }
}
