//! Distinctive-term extraction.
//!
//! Computes document-frequency statistics over the chunks of one source
//! and returns the words in the useful rarity band, scored by rarity,
//! length, and identifier shape. The output feeds follow-up queries.

use crate::error::Result;
use crate::store::{IndexStore, tokenize_distinct};
use std::collections::HashMap;

/// Default number of terms returned.
pub const DEFAULT_MAX_TERMS: usize = 40;

/// Words must appear in at least this many chunks.
const MIN_DF: usize = 2;

/// Extracts the most distinctive terms of a source.
///
/// Sources with fewer than three chunks return an empty list: document
/// frequency carries no signal there. Words outside the
/// `[2, max(3, ceil(0.4 * chunk_count))]` frequency band are dropped.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub fn distinctive_terms(
    store: &IndexStore,
    source_id: i64,
    max_terms: usize,
) -> Result<Vec<String>> {
    let Some(summary) = store.source_summary(source_id)? else {
        return Ok(Vec::new());
    };
    let chunk_count = summary.chunk_count;
    if chunk_count < 3 {
        return Ok(Vec::new());
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let max_df = 3.max((0.4 * chunk_count as f64).ceil() as usize);

    let mut df: HashMap<String, usize> = HashMap::new();
    for chunk in store.chunks_by_source(source_id)? {
        for word in tokenize_distinct(&chunk.body) {
            *df.entry(word).or_insert(0) += 1;
        }
    }

    let mut scored: Vec<(f64, String)> = df
        .into_iter()
        .filter(|&(_, count)| (MIN_DF..=max_df).contains(&count))
        .map(|(word, count)| (score(&word, count, chunk_count), word))
        .collect();

    // Descending by score, ties lexicographic for determinism
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
    });
    scored.truncate(max_terms);

    Ok(scored.into_iter().map(|(_, word)| word).collect())
}

/// Composite rarity/length/identifier-shape score.
///
/// The bonuses favor identifier-shaped tokens, which make the most
/// useful follow-up queries.
#[allow(clippy::cast_precision_loss)]
fn score(word: &str, df: usize, chunk_count: usize) -> f64 {
    let len = word.chars().count();
    let rarity = (chunk_count as f64 / df as f64).ln();
    let length_bonus = (len as f64 / 20.0).min(0.5);
    let identifier_bonus = if word.contains('_') {
        1.5
    } else if len >= 12 {
        0.8
    } else {
        0.0
    };
    rarity + length_bonus + identifier_bonus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Chunk;

    /// Ten chunks: `retry_backoff` in three of them, `everywhere` in all
    /// ten, `filler` words unique per chunk.
    fn ten_chunk_store() -> (IndexStore, i64) {
        let mut store = IndexStore::in_memory().unwrap();
        let chunks: Vec<Chunk> = (0..10)
            .map(|i| {
                let mut body = format!("everywhere unique{i} padding{i}");
                if i < 3 {
                    body.push_str(" retry_backoff");
                }
                Chunk::prose(format!("chunk {i}"), body)
            })
            .collect();
        let raw: String = chunks
            .iter()
            .map(|c| c.body.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let outcome = store.ingest("stats", &chunks, &raw).unwrap();
        (store, outcome.source_id)
    }

    #[test]
    fn test_identifier_in_band_is_returned() {
        let (store, source_id) = ten_chunk_store();
        let terms = distinctive_terms(&store, source_id, DEFAULT_MAX_TERMS).unwrap();
        assert!(terms.contains(&"retry_backoff".to_string()));
    }

    #[test]
    fn test_ubiquitous_words_excluded() {
        let (store, source_id) = ten_chunk_store();
        let terms = distinctive_terms(&store, source_id, DEFAULT_MAX_TERMS).unwrap();
        // df = 10 > max_df = max(3, ceil(0.4 * 10)) = 4
        assert!(!terms.contains(&"everywhere".to_string()));
    }

    #[test]
    fn test_singleton_words_excluded() {
        let (store, source_id) = ten_chunk_store();
        let terms = distinctive_terms(&store, source_id, DEFAULT_MAX_TERMS).unwrap();
        assert!(!terms.iter().any(|t| t.starts_with("unique")));
    }

    #[test]
    fn test_small_source_returns_empty() {
        let mut store = IndexStore::in_memory().unwrap();
        let chunks = vec![
            Chunk::prose("a", "alpha beta"),
            Chunk::prose("b", "alpha beta"),
        ];
        let outcome = store.ingest("tiny", &chunks, "alpha beta").unwrap();
        let terms = distinctive_terms(&store, outcome.source_id, 40).unwrap();
        assert!(terms.is_empty());
    }

    #[test]
    fn test_missing_source_returns_empty() {
        let store = IndexStore::in_memory().unwrap();
        let terms = distinctive_terms(&store, 999, 40).unwrap();
        assert!(terms.is_empty());
    }

    #[test]
    fn test_max_terms_truncates() {
        let mut store = IndexStore::in_memory().unwrap();
        // Every word appears in exactly two of four chunks
        let chunks = vec![
            Chunk::prose("a", "apple banana cherry dates"),
            Chunk::prose("b", "apple banana elderberry figs"),
            Chunk::prose("c", "cherry dates elderberry figs"),
            Chunk::prose("d", "grape melon grape melon"),
        ];
        let outcome = store.ingest("m", &chunks, "").unwrap();
        let terms = distinctive_terms(&store, outcome.source_id, 2).unwrap();
        assert_eq!(terms.len(), 2);
    }

    #[test]
    fn test_underscore_bonus_outranks_plain_word() {
        let mut store = IndexStore::in_memory().unwrap();
        // Same df and similar length: the identifier must score higher
        let chunks = vec![
            Chunk::prose("a", "retry_backoff elephants"),
            Chunk::prose("b", "retry_backoff elephants"),
            Chunk::prose("c", "padding words only"),
            Chunk::prose("d", "padding words only"),
        ];
        let outcome = store.ingest("bonus", &chunks, "").unwrap();
        let terms = distinctive_terms(&store, outcome.source_id, 40).unwrap();
        let id_pos = terms.iter().position(|t| t == "retry_backoff");
        let plain_pos = terms.iter().position(|t| t == "elephants");
        assert!(id_pos.unwrap() < plain_pos.unwrap());
    }

    #[test]
    fn test_score_components() {
        // Rarity only
        let base = score("abc", 2, 10);
        assert!((base - ((10.0f64 / 2.0).ln() + 3.0 / 20.0)).abs() < 1e-9);

        // Underscore bonus
        assert!(score("a_b_c", 2, 10) > score("abcde", 2, 10));

        // Long-word bonus caps at 0.5 length contribution
        let long = score(&"x".repeat(30), 2, 10);
        let expected = (10.0f64 / 2.0).ln() + 0.5 + 0.8;
        assert!((long - expected).abs() < 1e-9);
    }
}
