//! Document loading for ingestion.
//!
//! One entry point: [`read_document`]. Small files go through a plain
//! read; large ones are memory-mapped and decoded straight off the map
//! so the bytes are copied once, into the resulting `String`.

// Memory mapping requires unsafe but the mapping is read-only
#![allow(unsafe_code)]

use crate::error::{IoError, Result};
use memmap2::Mmap;
use std::borrow::Cow;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Files at or above this size are memory-mapped instead of read.
const MMAP_CUTOVER_BYTES: u64 = 1 << 20;

/// Ceiling on a single ingested document (1 GiB).
const MAX_DOCUMENT_BYTES: u64 = 1 << 30;

/// Loads a document for ingestion, decoding it as UTF-8.
///
/// Invalid UTF-8 sequences are replaced rather than rejected: ingested
/// documents come from the same pipeline as captured process output,
/// which is already decoded lossily, and a half-fetched page should
/// still be searchable. Replacements are logged.
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] for a missing path and
/// [`IoError::ReadFailed`] when the file cannot be opened or read, or
/// exceeds the document size ceiling.
///
/// # Examples
///
/// ```no_run
/// use ctxgate::io::read_document;
///
/// let content = read_document("notes.md").unwrap();
/// ```
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();

    let file = File::open(path).map_err(|e| open_error(path, &e))?;
    let len = file
        .metadata()
        .map_err(|e| read_error(path, &e.to_string()))?
        .len();
    if len > MAX_DOCUMENT_BYTES {
        return Err(read_error(
            path,
            &format!("document is {len} bytes, over the {MAX_DOCUMENT_BYTES} byte ceiling"),
        )
        .into());
    }

    if len < MMAP_CUTOVER_BYTES {
        let bytes = std::fs::read(path).map_err(|e| read_error(path, &e.to_string()))?;
        return Ok(decode(path, &bytes));
    }

    // Safety: the mapping is read-only and lives only for this decode
    let map = unsafe { Mmap::map(&file) }.map_err(|e| IoError::MmapFailed {
        path: path.to_string_lossy().to_string(),
        reason: e.to_string(),
    })?;
    Ok(decode(path, &map))
}

/// Decodes document bytes, logging when replacement characters were
/// substituted for invalid sequences.
fn decode(path: &Path, bytes: &[u8]) -> String {
    match String::from_utf8_lossy(bytes) {
        Cow::Borrowed(valid) => valid.to_string(),
        Cow::Owned(replaced) => {
            tracing::warn!(path = %path.display(), "invalid UTF-8 replaced during ingestion");
            replaced
        }
    }
}

fn open_error(path: &Path, e: &std::io::Error) -> IoError {
    if e.kind() == ErrorKind::NotFound {
        IoError::FileNotFound {
            path: path.to_string_lossy().to_string(),
        }
    } else {
        read_error(path, &e.to_string())
    }
}

fn read_error(path: &Path, reason: &str) -> IoError {
    IoError::ReadFailed {
        path: path.to_string_lossy().to_string(),
        reason: reason.to_string(),
    }
}
