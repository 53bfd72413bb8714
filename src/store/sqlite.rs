//! `SQLite` index store.
//!
//! Owns every persistent entity: sources, both full-text chunk
//! projections, and the vocabulary. Writes are transactional per
//! ingestion. The default store lives in a pid-scoped file in the OS
//! temp dir and is removed on drop; losing it on a crash is acceptable.

// SQLite stores all integers as i64. These casts are intentional and safe
// because we only store non-negative values that fit in usize.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

use crate::core::{Chunk, ContentKind};
use crate::error::{Result, StoreError};
use crate::search::{MatchLayer, SearchHit};
use crate::store::schema::SCHEMA_SQL;
use crate::store::tokenize::tokenize_distinct;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

/// Summary row for one ingested source.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SourceSummary {
    /// Auto-assigned source id.
    pub id: i64,
    /// Human label supplied at ingestion.
    pub label: String,
    /// Total chunks in the source.
    pub chunk_count: usize,
    /// Chunks classified as code.
    pub code_chunk_count: usize,
}

/// Outcome of one ingestion.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IndexOutcome {
    /// Id of the new source row.
    pub source_id: i64,
    /// Label the source was stored under.
    pub label: String,
    /// Total chunks committed.
    pub chunk_count: usize,
    /// Chunks classified as code.
    pub code_chunk_count: usize,
}

/// The embedded full-text index.
///
/// Single-writer: `&mut self` guards every mutation. Readers may run
/// concurrently with the writer under WAL journaling.
pub struct IndexStore {
    conn: Connection,
    path: Option<PathBuf>,
    ephemeral: bool,
}

impl IndexStore {
    /// Opens the default per-process store.
    ///
    /// The file lives in the OS temp dir under a pid-bearing name so
    /// concurrent gateway instances do not collide, and is removed when
    /// the store drops.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open_default() -> Result<Self> {
        let path = std::env::temp_dir().join(format!("ctxgate-{}.db", std::process::id()));
        let mut store = Self::open(&path)?;
        store.ephemeral = true;
        Ok(store)
    }

    /// Opens or creates a store at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Database(e.to_string()))?;
        }

        let conn = Connection::open(&path).map_err(StoreError::from)?;

        // WAL with normal durability: readers run beside the single
        // writer, and losing the index on a crash is acceptable.
        let _: String = conn
            .query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))
            .map_err(StoreError::from)?;
        conn.execute_batch("PRAGMA synchronous = NORMAL;")
            .map_err(StoreError::from)?;

        let store = Self {
            conn,
            path: Some(path),
            ephemeral: false,
        };
        store.init()?;
        Ok(store)
    }

    /// Creates an in-memory store. Useful for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::from)?;
        let store = Self {
            conn,
            path: None,
            ephemeral: false,
        };
        store.init()?;
        Ok(store)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA_SQL)
            .map_err(StoreError::from)?;
        Ok(())
    }

    /// Returns current Unix timestamp.
    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    /// Ingests one source: the source row and all of its chunks commit
    /// atomically, then vocabulary extraction runs over the raw text.
    ///
    /// A chunker that produced zero chunks still gets its source row.
    ///
    /// # Errors
    ///
    /// Returns an error when the transaction fails; nothing is committed
    /// in that case.
    pub fn ingest(&mut self, label: &str, chunks: &[Chunk], raw_text: &str) -> Result<IndexOutcome> {
        let code_chunk_count = chunks.iter().filter(|c| c.is_code()).count();
        let now = Self::now();

        let tx = self.conn.transaction().map_err(StoreError::from)?;
        tx.execute(
            r"
            INSERT INTO sources (label, chunk_count, code_chunk_count, indexed_at)
            VALUES (?, ?, ?, ?)
        ",
            params![label, chunks.len() as i64, code_chunk_count as i64, now],
        )
        .map_err(StoreError::from)?;
        let source_id = tx.last_insert_rowid();

        {
            let mut stemmed = tx
                .prepare(
                    "INSERT INTO chunks (title, body, source_id, content_type) VALUES (?, ?, ?, ?)",
                )
                .map_err(StoreError::from)?;
            let mut trigram = tx
                .prepare(
                    "INSERT INTO chunks_trigram (title, body, source_id, content_type) VALUES (?, ?, ?, ?)",
                )
                .map_err(StoreError::from)?;

            for chunk in chunks {
                let kind = chunk.kind.as_str();
                stemmed
                    .execute(params![chunk.title, chunk.body, source_id, kind])
                    .map_err(StoreError::from)?;
                trigram
                    .execute(params![chunk.title, chunk.body, source_id, kind])
                    .map_err(StoreError::from)?;
            }
        }

        tx.commit().map_err(StoreError::from)?;
        tracing::debug!(source_id, label, chunks = chunks.len(), "source committed");

        self.extend_vocabulary(raw_text)?;

        Ok(IndexOutcome {
            source_id,
            label: label.to_string(),
            chunk_count: chunks.len(),
            code_chunk_count,
        })
    }

    /// Inserts every distinct word of the text into the vocabulary.
    fn extend_vocabulary(&mut self, text: &str) -> Result<()> {
        let words = tokenize_distinct(text);
        if words.is_empty() {
            return Ok(());
        }

        let mut stmt = self
            .conn
            .prepare("INSERT OR IGNORE INTO vocabulary (word) VALUES (?)")
            .map_err(StoreError::from)?;
        for word in words {
            stmt.execute(params![word]).map_err(StoreError::from)?;
        }
        Ok(())
    }

    /// Lists all sources in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_sources(&self) -> Result<Vec<SourceSummary>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, label, chunk_count, code_chunk_count FROM sources ORDER BY id",
            )
            .map_err(StoreError::from)?;

        let sources = stmt
            .query_map([], |row| {
                Ok(SourceSummary {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    chunk_count: row.get::<_, i64>(2)? as usize,
                    code_chunk_count: row.get::<_, i64>(3)? as usize,
                })
            })
            .map_err(StoreError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;

        Ok(sources)
    }

    /// Looks up one source summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn source_summary(&self, source_id: i64) -> Result<Option<SourceSummary>> {
        let summary = self
            .conn
            .query_row(
                "SELECT id, label, chunk_count, code_chunk_count FROM sources WHERE id = ?",
                params![source_id],
                |row| {
                    Ok(SourceSummary {
                        id: row.get(0)?,
                        label: row.get(1)?,
                        chunk_count: row.get::<_, i64>(2)? as usize,
                        code_chunk_count: row.get::<_, i64>(3)? as usize,
                    })
                },
            )
            .optional()
            .map_err(StoreError::from)?;
        Ok(summary)
    }

    /// Returns all chunks of a source in insertion order, bypassing
    /// full-text matching. Used to enumerate a freshly indexed batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn chunks_by_source(&self, source_id: i64) -> Result<Vec<Chunk>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT title, body, content_type FROM chunks WHERE source_id = ? ORDER BY rowid",
            )
            .map_err(StoreError::from)?;

        let chunks = stmt
            .query_map(params![source_id], |row| {
                Ok(Chunk {
                    title: row.get(0)?,
                    body: row.get(1)?,
                    kind: ContentKind::parse(&row.get::<_, String>(2)?),
                })
            })
            .map_err(StoreError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;

        Ok(chunks)
    }

    /// Runs an FTS5 MATCH query over one of the chunk projections.
    ///
    /// Ranked by BM25 with title weight 2.0 and body weight 1.0; the
    /// engine reports negative relevance, so lower is better. When
    /// `source` is given, results are restricted to sources whose label
    /// contains the substring.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub(crate) fn query_fts(
        &self,
        trigram: bool,
        match_query: &str,
        limit: usize,
        source: Option<&str>,
        layer: MatchLayer,
    ) -> Result<Vec<SearchHit>> {
        let table = if trigram { "chunks_trigram" } else { "chunks" };
        let sql = format!(
            r"
            SELECT {table}.title, {table}.body, sources.label,
                   bm25({table}, 2.0, 1.0) AS rank, {table}.content_type
            FROM {table}
            JOIN sources ON sources.id = {table}.source_id
            WHERE {table} MATCH ?1
              AND (?2 IS NULL OR sources.label LIKE '%' || ?2 || '%')
            ORDER BY rank
            LIMIT ?3
        "
        );

        let mut stmt = self.conn.prepare(&sql).map_err(StoreError::from)?;
        let hits = stmt
            .query_map(params![match_query, source, limit as i64], |row| {
                Ok(SearchHit {
                    title: row.get(0)?,
                    body: row.get(1)?,
                    source_label: row.get(2)?,
                    rank: row.get(3)?,
                    kind: ContentKind::parse(&row.get::<_, String>(4)?),
                    layer,
                })
            })
            .map_err(StoreError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;

        Ok(hits)
    }

    /// Returns vocabulary words whose character length is within
    /// `budget` of `word_len`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub(crate) fn vocabulary_candidates(
        &self,
        word_len: usize,
        budget: usize,
    ) -> Result<Vec<String>> {
        let lo = word_len.saturating_sub(budget) as i64;
        let hi = (word_len + budget) as i64;

        let mut stmt = self
            .conn
            .prepare("SELECT word FROM vocabulary WHERE length(word) BETWEEN ? AND ?")
            .map_err(StoreError::from)?;

        let words = stmt
            .query_map(params![lo, hi], |row| row.get(0))
            .map_err(StoreError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::from)?;

        Ok(words)
    }

    /// Counts vocabulary entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn vocabulary_len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM vocabulary", [], |row| row.get(0))
            .map_err(StoreError::from)?;
        Ok(count as usize)
    }
}

impl Drop for IndexStore {
    fn drop(&mut self) {
        if !self.ephemeral {
            return;
        }
        if let Some(path) = &self.path {
            let _ = std::fs::remove_file(path);
            // WAL sidecars
            let _ = std::fs::remove_file(path.with_extension("db-wal"));
            let _ = std::fs::remove_file(path.with_extension("db-shm"));
        }
    }
}
