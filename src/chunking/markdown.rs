//! Markdown chunking.
//!
//! A line-oriented state machine over the input: `IDLE` accumulates the
//! current section body, `IN_CODE` keeps fenced blocks atomic. Headings
//! (levels 1-4) flush the current body and maintain a heading stack whose
//! join becomes the chunk title; horizontal rules flush without entering
//! the stack.

use crate::core::{Chunk, ContentKind};
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,4})\s+(.*)$").expect("hardcoded regex"));

#[allow(clippy::expect_used)]
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(`{3,})").expect("hardcoded regex"));

#[allow(clippy::expect_used)]
static HR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-_*]{3,}\s*$").expect("hardcoded regex"));

/// One entry on the heading stack.
struct HeadingFrame {
    level: usize,
    text: String,
}

/// Splits Markdown into heading-scoped chunks.
///
/// Chunk titles are the heading stack joined with `" > "` (`"Untitled"`
/// when no heading is open). A chunk is classified as code when its body
/// contains any fence line. Fenced blocks are never split across chunks;
/// empty bodies are dropped.
///
/// # Examples
///
/// ```
/// use ctxgate::chunking::chunk_markdown;
///
/// let chunks = chunk_markdown("# Setup\ninstall it\n## Linux\napt install\n");
/// assert_eq!(chunks[0].title, "Setup");
/// assert_eq!(chunks[1].title, "Setup > Linux");
/// ```
#[must_use]
pub fn chunk_markdown(text: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut stack: Vec<HeadingFrame> = Vec::new();
    let mut body: Vec<&str> = Vec::new();
    let mut in_code = false;
    let mut opening_width = 0usize;

    for line in text.lines() {
        if in_code {
            body.push(line);
            if let Some(width) = fence_width(line)
                && width >= opening_width
            {
                in_code = false;
            }
            continue;
        }

        if let Some(width) = fence_width(line) {
            in_code = true;
            opening_width = width;
            body.push(line);
            continue;
        }

        if let Some(caps) = HEADING_RE.captures(line) {
            flush(&mut chunks, &stack, &mut body);
            let level = caps[1].len();
            let heading = caps[2].trim().to_string();
            while stack.last().is_some_and(|frame| frame.level >= level) {
                stack.pop();
            }
            stack.push(HeadingFrame {
                level,
                text: heading,
            });
            body.push(line);
            continue;
        }

        if HR_RE.is_match(line) {
            flush(&mut chunks, &stack, &mut body);
            continue;
        }

        body.push(line);
    }

    flush(&mut chunks, &stack, &mut body);
    chunks
}

/// Width of a fence line in backticks, if the line is a fence.
fn fence_width(line: &str) -> Option<usize> {
    FENCE_RE.captures(line).map(|caps| caps[1].len())
}

/// Emits the accumulated body as a chunk; empty bodies are dropped.
fn flush(chunks: &mut Vec<Chunk>, stack: &[HeadingFrame], body: &mut Vec<&str>) {
    let text = body.join("\n");
    body.clear();
    if text.trim().is_empty() {
        return;
    }

    let title = if stack.is_empty() {
        "Untitled".to_string()
    } else {
        stack
            .iter()
            .map(|frame| frame.text.as_str())
            .collect::<Vec<_>>()
            .join(" > ")
    };

    let kind = if text.lines().any(|line| fence_width(line).is_some()) {
        ContentKind::Code
    } else {
        ContentKind::Prose
    };

    chunks.push(Chunk::new(title, text, kind));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_hierarchy_titles() {
        let text = "# A\ntext1\n## B\ntext2\n---\n## C\n```\ncode\n```\n";
        let chunks = chunk_markdown(text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].title, "A");
        assert_eq!(chunks[1].title, "A > B");
        assert_eq!(chunks[2].title, "A > C");
        assert_eq!(chunks[2].kind, ContentKind::Code);
        assert_eq!(chunks[0].kind, ContentKind::Prose);
    }

    #[test]
    fn test_sibling_heading_pops_stack() {
        let text = "# A\n## B\nb\n## C\nc\n# D\nd\n";
        let chunks = chunk_markdown(text);
        let titles: Vec<&str> = chunks.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "A > B", "A > C", "D"]);
    }

    #[test]
    fn test_untitled_preamble() {
        let text = "no heading yet\n# A\nbody\n";
        let chunks = chunk_markdown(text);
        assert_eq!(chunks[0].title, "Untitled");
        assert_eq!(chunks[0].body, "no heading yet");
        assert_eq!(chunks[1].title, "A");
    }

    #[test]
    fn test_heading_line_stays_in_body() {
        let chunks = chunk_markdown("# A\nbody\n");
        assert_eq!(chunks[0].body, "# A\nbody");
    }

    #[test]
    fn test_fenced_block_atomic() {
        let text = "# A\n```\n# not a heading\n---\n```\nafter\n";
        let chunks = chunk_markdown(text);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].body.contains("# not a heading"));
        assert!(chunks[0].body.contains("---"));
        assert_eq!(chunks[0].kind, ContentKind::Code);
    }

    #[test]
    fn test_wider_closing_fence_accepted() {
        let text = "```\ncode\n````\nafter\n";
        let chunks = chunk_markdown(text);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].body.contains("after"));
    }

    #[test]
    fn test_narrower_fence_stays_inside() {
        let text = "````\n```\nstill code\n````\n";
        let chunks = chunk_markdown(text);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].body.contains("still code"));
    }

    #[test]
    fn test_horizontal_rule_flushes() {
        let text = "first\n---\nsecond\n";
        let chunks = chunk_markdown(text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].body, "first");
        assert_eq!(chunks[1].body, "second");
    }

    #[test]
    fn test_hr_variants() {
        for rule in ["---", "___", "***", "-----", "---  "] {
            let text = format!("a\n{rule}\nb\n");
            assert_eq!(chunk_markdown(&text).len(), 2, "rule {rule:?}");
        }
    }

    #[test]
    fn test_deep_heading_is_body() {
        // Level 5+ headings are not section boundaries
        let text = "# A\n##### deep\nbody\n";
        let chunks = chunk_markdown(text);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].body.contains("##### deep"));
    }

    #[test]
    fn test_heading_only_sections_survive() {
        let text = "# A\n# B\nbody\n";
        let chunks = chunk_markdown(text);
        let titles: Vec<&str> = chunks.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_markdown("").is_empty());
        assert!(chunk_markdown("\n\n\n").is_empty());
    }

    #[test]
    fn test_unclosed_fence_flushes_at_eof() {
        let text = "# A\n```\nnever closed\n";
        let chunks = chunk_markdown(text);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].body.contains("never closed"));
        assert_eq!(chunks[0].kind, ContentKind::Code);
    }

    #[test]
    fn test_line_preservation() {
        let text = "# A\nalpha\n## B\nbeta\n---\ngamma\n```\ndelta\n```\n";
        let chunks = chunk_markdown(text);
        let joined: String = chunks
            .iter()
            .map(|c| c.body.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        for line in text.lines() {
            if line == "---" {
                continue; // consumed separator
            }
            assert!(joined.contains(line), "lost line {line:?}");
        }
    }
}
