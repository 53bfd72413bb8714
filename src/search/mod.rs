//! Query sanitization and the three-tier fallback search.
//!
//! Queries run against the stemmed index first, escalate to the trigram
//! projection for substring-like matching, and finally to fuzzy
//! correction against the vocabulary. Every tier ranks by BM25 with
//! title weight 2.0 and body weight 1.0; the engine reports negative
//! relevance, so lower ranks are better.

pub mod fuzzy;
pub mod terms;

pub use fuzzy::{edit_budget, fuzzy_correct};
pub use terms::{DEFAULT_MAX_TERMS, distinctive_terms};

use crate::core::ContentKind;
use crate::error::Result;
use crate::store::IndexStore;
use serde::Serialize;

/// Default number of results returned by a search.
pub const DEFAULT_LIMIT: usize = 3;

/// FTS operator characters stripped from user queries.
const OPERATOR_CHARS: &[char] = &[
    '\'', '"', '(', ')', '{', '}', '[', ']', '*', ':', '^', '~',
];

/// Reserved FTS operator words discarded from user queries.
const RESERVED_WORDS: &[&str] = &["AND", "OR", "NOT", "NEAR"];

/// Which fallback tier produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchLayer {
    /// Word-level match through the Porter-stemmed index.
    Stemmed,
    /// Substring-like match through the trigram projection.
    Substring,
    /// Match found after fuzzy-correcting the query.
    Fuzzy,
}

impl std::fmt::Display for MatchLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Stemmed => "stemmed",
            Self::Substring => "substring",
            Self::Fuzzy => "fuzzy",
        })
    }
}

/// One ranked search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// Chunk title.
    pub title: String,
    /// Chunk body.
    pub body: String,
    /// Label of the source the chunk belongs to.
    pub source_label: String,
    /// BM25 rank; lower is better.
    pub rank: f64,
    /// Content classification of the chunk.
    pub kind: ContentKind,
    /// Tier that produced this hit.
    pub layer: MatchLayer,
}

/// Sanitizes a user query into an FTS5 MATCH expression.
///
/// Strips operator characters, discards reserved operator words, quotes
/// each remaining word, and joins with `OR`. An empty outcome yields the
/// literal query `""`, which matches nothing.
#[must_use]
pub fn sanitize_match_query(query: &str) -> String {
    let stripped: String = query
        .chars()
        .filter(|c| !OPERATOR_CHARS.contains(c))
        .collect();

    let words: Vec<String> = stripped
        .split_whitespace()
        .filter(|word| {
            !RESERVED_WORDS
                .iter()
                .any(|reserved| word.eq_ignore_ascii_case(reserved))
        })
        .map(|word| format!("\"{word}\""))
        .collect();

    if words.is_empty() {
        "\"\"".to_string()
    } else {
        words.join(" OR ")
    }
}

/// Builds a trigram-friendly MATCH expression.
///
/// Keeps only words of at least three characters (shorter words have no
/// trigram to match). Returns `None` when nothing remains, which skips
/// the substring tier entirely.
#[must_use]
pub fn trigram_match_query(query: &str) -> Option<String> {
    let stripped: String = query
        .chars()
        .filter(|c| !OPERATOR_CHARS.contains(c))
        .collect();

    let words: Vec<String> = stripped
        .split_whitespace()
        .filter(|word| {
            word.chars().count() >= 3
                && !RESERVED_WORDS
                    .iter()
                    .any(|reserved| word.eq_ignore_ascii_case(reserved))
        })
        .map(|word| format!("\"{word}\""))
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" OR "))
    }
}

/// Runs the three-tier fallback search.
///
/// 1. Stemmed MATCH against the Porter index.
/// 2. If empty, substring MATCH against the trigram projection.
/// 3. If still empty, fuzzy-correct each query word against the
///    vocabulary and re-run the first two tiers with the corrected
///    query.
///
/// Tier failures never raise: an unparseable query collapses to an
/// empty result instead.
///
/// # Errors
///
/// Returns an error only for vocabulary lookups failing at the storage
/// layer; MATCH-level failures are folded into empty tiers.
pub fn search_with_fallback(
    store: &IndexStore,
    query: &str,
    limit: usize,
    source: Option<&str>,
) -> Result<Vec<SearchHit>> {
    let stemmed = run_tier(store, false, &sanitize_match_query(query), limit, source, MatchLayer::Stemmed);
    if !stemmed.is_empty() {
        return Ok(stemmed);
    }

    if let Some(trigram_query) = trigram_match_query(query) {
        let substring = run_tier(store, true, &trigram_query, limit, source, MatchLayer::Substring);
        if !substring.is_empty() {
            tracing::debug!(query, "substring tier answered");
            return Ok(substring);
        }
    }

    let Some(corrected) = correct_query(store, query)? else {
        return Ok(Vec::new());
    };
    tracing::debug!(query, corrected = %corrected, "fuzzy tier correcting query");

    let fuzzy = run_tier(
        store,
        false,
        &sanitize_match_query(&corrected),
        limit,
        source,
        MatchLayer::Fuzzy,
    );
    if !fuzzy.is_empty() {
        return Ok(fuzzy);
    }

    if let Some(trigram_query) = trigram_match_query(&corrected) {
        return Ok(run_tier(
            store,
            true,
            &trigram_query,
            limit,
            source,
            MatchLayer::Fuzzy,
        ));
    }

    Ok(Vec::new())
}

/// Runs one MATCH tier, folding engine failures into an empty tier.
fn run_tier(
    store: &IndexStore,
    trigram: bool,
    match_query: &str,
    limit: usize,
    source: Option<&str>,
    layer: MatchLayer,
) -> Vec<SearchHit> {
    match store.query_fts(trigram, match_query, limit, source, layer) {
        Ok(hits) => hits,
        Err(e) => {
            tracing::debug!(match_query, error = %e, "search tier collapsed to empty");
            Vec::new()
        }
    }
}

/// Fuzzy-corrects the query word by word.
///
/// Returns `None` when no word changes.
fn correct_query(store: &IndexStore, query: &str) -> Result<Option<String>> {
    let words: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() >= 3)
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        return Ok(None);
    }

    let mut changed = false;
    let mut corrected = Vec::with_capacity(words.len());
    for word in &words {
        match fuzzy_correct(store, word)? {
            Some(better) => {
                changed = true;
                corrected.push(better);
            }
            None => corrected.push(word.clone()),
        }
    }

    if changed {
        Ok(Some(corrected.join(" ")))
    } else {
        Ok(None)
    }
}
