//! Word tokenization shared by vocabulary extraction and the
//! distinctive-term extractor.
//!
//! Tokens are maximal runs of letters, digits, `_` and `-`, lowercased.
//! Words shorter than three characters or on the stop-list are dropped.

use std::collections::BTreeSet;

/// Minimum word length kept by the tokenizer.
pub const MIN_WORD_LEN: usize = 3;

/// Common words excluded from the vocabulary and term statistics.
pub const STOP_WORDS: &[&str] = &[
    "about", "after", "all", "also", "and", "any", "are", "been", "but",
    "can", "come", "could", "did", "each", "for", "from", "get", "had",
    "has", "have", "her", "here", "him", "his", "how", "into", "its",
    "just", "know", "like", "make", "many", "more", "most", "much",
    "new", "not", "now", "one", "only", "other", "our", "out", "over",
    "said", "see", "she", "should", "some", "such", "take", "than",
    "that", "the", "their", "them", "then", "there", "these", "they",
    "this", "time", "two", "use", "very", "was", "way", "well", "were",
    "what", "when", "which", "who", "will", "with", "would", "you",
    "your",
];

/// Returns true when the word is on the stop-list.
#[must_use]
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

/// Tokenizes text into lowercase words, preserving order and duplicates.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-'))
        .map(str::to_lowercase)
        .filter(|word| word.chars().count() >= MIN_WORD_LEN && !is_stop_word(word))
        .collect()
}

/// Tokenizes text into the set of distinct words.
#[must_use]
pub fn tokenize_distinct(text: &str) -> BTreeSet<String> {
    tokenize(text).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_words_sorted_for_binary_search() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS);
    }

    #[test]
    fn test_tokenize_basic() {
        let words = tokenize("Rebuild the retry_backoff logic!");
        assert_eq!(words, vec!["rebuild", "retry_backoff", "logic"]);
    }

    #[test]
    fn test_tokenize_keeps_identifier_chars() {
        let words = tokenize("use half-open state_machine v2");
        assert!(words.contains(&"half-open".to_string()));
        assert!(words.contains(&"state_machine".to_string()));
    }

    #[test]
    fn test_tokenize_drops_short_and_stop_words() {
        let words = tokenize("it is the answer to x1");
        assert_eq!(words, vec!["answer"]);
    }

    #[test]
    fn test_tokenize_lowercases() {
        assert_eq!(tokenize("HTTP Request"), vec!["http", "request"]);
    }

    #[test]
    fn test_tokenize_distinct_dedupes() {
        let distinct = tokenize_distinct("alpha beta alpha gamma beta");
        assert_eq!(distinct.len(), 3);
    }

    #[test]
    fn test_is_stop_word() {
        assert!(is_stop_word("the"));
        assert!(is_stop_word("would"));
        assert!(!is_stop_word("backoff"));
    }
}
