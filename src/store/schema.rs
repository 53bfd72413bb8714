//! Database schema definitions.
//!
//! Contains the SQL schema for the ctxgate `SQLite` index. The index is
//! per-process ephemeral, so there is no migration machinery: every
//! process starts from a fresh file.

/// SQL schema for database setup.
///
/// Two FTS5 projections of the same chunks: `chunks` with Porter
/// stemming for word-level matching, `chunks_trigram` with character
/// trigrams for substring-like matching. `vocabulary` is the flat word
/// set consulted by the fuzzy search layer.
pub const SCHEMA_SQL: &str = r"
-- Ingestion groups
CREATE TABLE IF NOT EXISTS sources (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    label TEXT NOT NULL,
    chunk_count INTEGER NOT NULL DEFAULT 0,
    code_chunk_count INTEGER NOT NULL DEFAULT 0,
    indexed_at INTEGER NOT NULL
);

-- Stemmed full-text index over chunks
CREATE VIRTUAL TABLE IF NOT EXISTS chunks USING fts5(
    title,
    body,
    source_id UNINDEXED,
    content_type UNINDEXED,
    tokenize='porter unicode61'
);

-- Trigram projection for substring-like queries
CREATE VIRTUAL TABLE IF NOT EXISTS chunks_trigram USING fts5(
    title,
    body,
    source_id UNINDEXED,
    content_type UNINDEXED,
    tokenize='trigram'
);

-- Word set for fuzzy correction
CREATE TABLE IF NOT EXISTS vocabulary (
    word TEXT PRIMARY KEY
) WITHOUT ROWID;
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_sql_not_empty() {
        assert!(!SCHEMA_SQL.is_empty());
        assert!(SCHEMA_SQL.contains("CREATE TABLE"));
        assert!(SCHEMA_SQL.contains("fts5"));
    }

    #[test]
    fn test_schema_has_both_tokenizers() {
        assert!(SCHEMA_SQL.contains("porter unicode61"));
        assert!(SCHEMA_SQL.contains("trigram"));
    }
}
