//! Fuzzy query correction against the vocabulary.
//!
//! Each query word gets a length-dependent edit budget; the closest
//! vocabulary word within that budget (and within the same length
//! window) replaces it. The word itself is never returned, so a
//! correction always changes the query.

use crate::error::Result;
use crate::store::IndexStore;

/// Edit budget for a word of the given character length.
#[must_use]
pub const fn edit_budget(len: usize) -> usize {
    if len <= 4 {
        1
    } else if len <= 12 {
        2
    } else {
        3
    }
}

/// Finds the closest vocabulary word within the edit budget.
///
/// Candidates are pre-filtered by the store to words whose length is
/// within the budget of the input's length. Ties on distance resolve to
/// the lexicographically smallest candidate for determinism.
///
/// # Errors
///
/// Returns an error if the vocabulary lookup fails.
pub fn fuzzy_correct(store: &IndexStore, word: &str) -> Result<Option<String>> {
    let len = word.chars().count();
    if len < 3 {
        return Ok(None);
    }
    let budget = edit_budget(len);

    let mut best: Option<(usize, String)> = None;
    for candidate in store.vocabulary_candidates(len, budget)? {
        if candidate == word {
            continue;
        }
        let distance = strsim::levenshtein(word, &candidate);
        if distance > budget {
            continue;
        }
        let better = match &best {
            None => true,
            Some((best_distance, best_word)) => {
                distance < *best_distance
                    || (distance == *best_distance && candidate < *best_word)
            }
        };
        if better {
            best = Some((distance, candidate));
        }
    }

    Ok(best.map(|(_, word)| word))
}
