//! Plain-text chunking.
//!
//! Preferred split: blank-line sections, used when the text is regular
//! enough (a sane section count, no oversized section). Otherwise the
//! whole text becomes one chunk when it is short, or fixed-line windows
//! with a small overlap when it is long.

use crate::chunking::{OVERLAP_LINES, truncate_title};
use crate::core::Chunk;
use regex::Regex;
use std::sync::LazyLock;

/// Blank-line section counts outside this range fall back to windows.
const MIN_SECTIONS: usize = 3;
const MAX_SECTIONS: usize = 200;

/// A single blank-line section larger than this falls back to windows.
const MAX_SECTION_BYTES: usize = 5_000;

#[allow(clippy::expect_used)]
static BLANK_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("hardcoded regex"));

/// Splits plain text into retrieval chunks.
///
/// # Arguments
///
/// * `text` - The input text.
/// * `lines_per_chunk` - Window height for the fixed-window fallback.
///
/// # Examples
///
/// ```
/// use ctxgate::chunking::chunk_plain;
///
/// let chunks = chunk_plain("one short result\n", 50);
/// assert_eq!(chunks.len(), 1);
/// assert_eq!(chunks[0].title, "Output");
/// ```
#[must_use]
pub fn chunk_plain(text: &str, lines_per_chunk: usize) -> Vec<Chunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let lines_per_chunk = lines_per_chunk.max(1);

    if let Some(chunks) = split_blank_sections(text) {
        return chunks;
    }

    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= lines_per_chunk {
        return vec![Chunk::prose("Output", text)];
    }

    window_chunks(&lines, lines_per_chunk)
}

/// Tries the blank-line strategy; `None` means fall back.
fn split_blank_sections(text: &str) -> Option<Vec<Chunk>> {
    let sections: Vec<&str> = BLANK_SPLIT_RE
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .collect();

    if sections.len() < MIN_SECTIONS || sections.len() > MAX_SECTIONS {
        return None;
    }
    if sections.iter().any(|s| s.len() >= MAX_SECTION_BYTES) {
        return None;
    }

    Some(
        sections
            .iter()
            .enumerate()
            .map(|(i, section)| {
                let title = section
                    .lines()
                    .find(|line| !line.trim().is_empty())
                    .map_or_else(|| format!("Section {}", i + 1), |l| truncate_title(l.trim()));
                Chunk::prose(title, *section)
            })
            .collect(),
    )
}

/// Fixed-size windows stepping by `lines_per_chunk - OVERLAP_LINES`.
fn window_chunks(lines: &[&str], lines_per_chunk: usize) -> Vec<Chunk> {
    let step = lines_per_chunk.saturating_sub(OVERLAP_LINES).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + lines_per_chunk).min(lines.len());
        let body = lines[start..end].join("\n");
        let first = lines[start].trim();
        let title = if first.is_empty() {
            format!("Lines {}-{}", start + 1, end)
        } else {
            truncate_title(first)
        };
        chunks.push(Chunk::prose(title, body));

        if end >= lines.len() {
            break;
        }
        start += step;
    }

    chunks
}
