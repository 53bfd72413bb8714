//! Chunking strategies for ctxgate.
//!
//! Splits ingested text into retrieval units by two strategies:
//!
//! - **Markdown**: heading-hierarchy sections keeping fenced code blocks
//!   atomic and breaking on horizontal rules
//! - **Plain**: blank-line sections when the text is regular, otherwise
//!   fixed-line windows with a small overlap
//!
//! Strategy selection is always an explicit argument, never inferred
//! from content.

pub mod markdown;
pub mod plain;

pub use markdown::chunk_markdown;
pub use plain::chunk_plain;

use crate::core::Chunk;

/// Default window height for plain-text chunking, in lines.
pub const DEFAULT_LINES_PER_CHUNK: usize = 50;

/// Overlap between consecutive plain-text windows, in lines.
pub const OVERLAP_LINES: usize = 2;

/// Maximum title width, in grapheme clusters.
pub const MAX_TITLE_WIDTH: usize = 80;

/// Chunking strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkStrategy {
    /// Markdown heading hierarchy.
    #[default]
    Markdown,
    /// Plain-text grouping.
    Plain,
}

impl ChunkStrategy {
    /// Parses a strategy name; anything other than a plain-text alias
    /// selects Markdown.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "text" | "plain" | "plaintext" => Self::Plain,
            _ => Self::Markdown,
        }
    }

    /// Runs this strategy over the input.
    #[must_use]
    pub fn chunk(self, text: &str) -> Vec<Chunk> {
        match self {
            Self::Markdown => chunk_markdown(text),
            Self::Plain => chunk_plain(text, DEFAULT_LINES_PER_CHUNK),
        }
    }
}

/// Truncates a title to [`MAX_TITLE_WIDTH`] grapheme clusters.
#[must_use]
pub(crate) fn truncate_title(s: &str) -> String {
    use unicode_segmentation::UnicodeSegmentation;
    s.graphemes(true).take(MAX_TITLE_WIDTH).collect()
}
