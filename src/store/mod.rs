//! Embedded full-text index for ctxgate.
//!
//! Backed by `SQLite` FTS5 with two tokenizations of every chunk
//! (Porter-stemmed and character-trigram) plus a vocabulary table for
//! fuzzy correction. The index is per-process ephemeral.

pub mod schema;
pub mod sqlite;
pub mod tokenize;

pub use sqlite::{IndexOutcome, IndexStore, SourceSummary};
pub use tokenize::{STOP_WORDS, is_stop_word, tokenize, tokenize_distinct};
