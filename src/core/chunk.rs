//! Retrieval chunk representation.
//!
//! Chunks are the retrieval units produced by the chunking strategies and
//! stored in the full-text index. Each chunk carries a title (the heading
//! path for Markdown, a line label for plain text), a body, and a content
//! classification.

use serde::{Deserialize, Serialize};

/// Content classification of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// The body contains at least one fenced code block.
    Code,
    /// Plain prose.
    Prose,
}

impl ContentKind {
    /// Returns the storage representation of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Prose => "prose",
        }
    }

    /// Parses the storage representation back into a kind.
    ///
    /// Anything other than `"code"` is treated as prose.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s == "code" { Self::Code } else { Self::Prose }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A retrieval unit produced by a chunking strategy.
///
/// # Examples
///
/// ```
/// use ctxgate::core::{Chunk, ContentKind};
///
/// let chunk = Chunk::new("Setup > Install", "Run the installer.", ContentKind::Prose);
/// assert_eq!(chunk.title, "Setup > Install");
/// assert!(!chunk.is_code());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Hierarchical title ("A > B" for Markdown, line label for plain text).
    pub title: String,

    /// Chunk body text.
    pub body: String,

    /// Content classification.
    pub kind: ContentKind,
}

impl Chunk {
    /// Creates a new chunk.
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            kind,
        }
    }

    /// Creates a prose chunk.
    #[must_use]
    pub fn prose(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body, ContentKind::Prose)
    }

    /// Creates a code chunk.
    #[must_use]
    pub fn code(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(title, body, ContentKind::Code)
    }

    /// Returns true if this chunk contains fenced code.
    #[must_use]
    pub const fn is_code(&self) -> bool {
        matches!(self.kind, ContentKind::Code)
    }

    /// Returns the size of the chunk body in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.body.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_new() {
        let chunk = Chunk::new("Title", "body", ContentKind::Prose);
        assert_eq!(chunk.title, "Title");
        assert_eq!(chunk.body, "body");
        assert!(!chunk.is_code());
    }

    #[test]
    fn test_chunk_code() {
        let chunk = Chunk::code("Title", "```\nlet x = 1;\n```");
        assert!(chunk.is_code());
        assert_eq!(chunk.kind, ContentKind::Code);
    }

    #[test]
    fn test_content_kind_roundtrip() {
        assert_eq!(ContentKind::parse(ContentKind::Code.as_str()), ContentKind::Code);
        assert_eq!(ContentKind::parse(ContentKind::Prose.as_str()), ContentKind::Prose);
        // Unknown values degrade to prose
        assert_eq!(ContentKind::parse("mystery"), ContentKind::Prose);
    }

    #[test]
    fn test_content_kind_display() {
        assert_eq!(ContentKind::Code.to_string(), "code");
        assert_eq!(ContentKind::Prose.to_string(), "prose");
    }

    #[test]
    fn test_chunk_size() {
        let chunk = Chunk::prose("t", "hello");
        assert_eq!(chunk.size(), 5);
    }

    #[test]
    fn test_chunk_serde() {
        let chunk = Chunk::code("A > B", "```\ncode\n```");
        let json = serde_json::to_string(&chunk).unwrap();
        assert!(json.contains("\"code\""));
        let back: Chunk = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chunk);
    }
}
