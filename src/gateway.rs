//! The gateway facade.
//!
//! One [`Gateway`] per process owns the detected runtime map and the
//! index store, and exposes the three core operations: execute, index,
//! and search. The surface is single-threaded cooperative: one in-flight
//! operation at a time, driven by the caller.

use crate::chunking::ChunkStrategy;
use crate::core::{Chunk, ExecRequest, ExecResult, Limits};
use crate::error::{Error, ExecError, Result};
use crate::io::read_document;
use crate::runtime::{RuntimeSet, SandboxWrap, Supervisor, create_scratch_dir, materialize};
use crate::search::{self, SearchHit};
use crate::store::{IndexOutcome, IndexStore, SourceSummary};
use std::path::PathBuf;

/// A request to ingest content into the store.
#[derive(Debug, Clone, Default)]
pub struct IndexRequest {
    /// Inline content; wins over `path` when both are present.
    pub content: Option<String>,
    /// File to ingest when no inline content is given.
    pub path: Option<PathBuf>,
    /// Source label; defaults to the path, else `"untitled"`.
    pub label: Option<String>,
    /// Chunking strategy; always explicit, never inferred.
    pub strategy: ChunkStrategy,
}

impl IndexRequest {
    /// Builds a request for inline content.
    #[must_use]
    pub fn from_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Builds a request for a file path.
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Sets the source label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the chunking strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: ChunkStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// The core gateway: polyglot executor plus content store.
pub struct Gateway {
    runtimes: RuntimeSet,
    store: IndexStore,
    supervisor: Supervisor,
}

impl Gateway {
    /// Constructs a gateway with the default per-process store.
    ///
    /// Runtime detection runs once here; the map is immutable afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened.
    pub fn new() -> Result<Self> {
        Ok(Self::with_store(IndexStore::open_default()?))
    }

    /// Constructs a gateway over an existing store.
    #[must_use]
    pub fn with_store(store: IndexStore) -> Self {
        Self {
            runtimes: RuntimeSet::detect(),
            store,
            supervisor: Supervisor::new(Limits::default()),
        }
    }

    /// Overrides the supervisor output limits.
    #[must_use]
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.supervisor = Supervisor::new(limits);
        self
    }

    /// Configures the optional sandbox wrap callback.
    #[must_use]
    pub fn with_sandbox_wrap(mut self, wrap: SandboxWrap) -> Self {
        self.supervisor = Supervisor::new(self.supervisor.limits()).with_sandbox_wrap(wrap);
        self
    }

    /// The detected runtime map.
    #[must_use]
    pub const fn runtimes(&self) -> &RuntimeSet {
        &self.runtimes
    }

    /// Executes one code fragment.
    ///
    /// The scratch directory lives on this call frame, so it is released
    /// on every exit path including timeouts, cap breaches, and panics.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::LanguageUnavailable`] when no runtime serves
    /// the language, `BadRequest` for a non-positive timeout, and
    /// [`crate::error::IoError`] for scratch or script failures. Spawn
    /// failures and everything later fold into the result.
    pub fn execute(&self, request: &ExecRequest) -> Result<ExecResult> {
        if request.timeout_ms == 0 {
            return Err(Error::bad_request("timeout must be positive"));
        }

        let runtime = self.runtimes.get(request.language);
        if !runtime.available {
            return Err(ExecError::LanguageUnavailable {
                language: request.language.tag().to_string(),
            }
            .into());
        }

        let scratch = create_scratch_dir()?;
        let script = materialize(
            scratch.path(),
            request.language,
            &request.code,
            request.target_file.as_deref(),
        )?;

        let Some(plan) = runtime.invocation.resolve(&script) else {
            return Err(ExecError::LanguageUnavailable {
                language: request.language.tag().to_string(),
            }
            .into());
        };

        let env = crate::runtime::build_child_env(request.language, scratch.path());
        let workdir = request
            .workdir
            .clone()
            .unwrap_or_else(|| scratch.path().to_path_buf());

        tracing::info!(language = %request.language, timeout_ms = request.timeout_ms, "execute");
        Ok(self.supervisor.run(&plan, &workdir, request.timeout_ms, &env))
    }

    /// Ingests content into the store.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` when neither content nor path is given, and
    /// I/O or store errors otherwise.
    pub fn index(&mut self, request: &IndexRequest) -> Result<IndexOutcome> {
        let text = match (&request.content, &request.path) {
            (Some(content), _) => content.clone(),
            (None, Some(path)) => read_document(path)?,
            (None, None) => {
                return Err(Error::bad_request(
                    "index requires content or path",
                ));
            }
        };

        let label = request.label.clone().unwrap_or_else(|| {
            request.path.as_ref().map_or_else(
                || "untitled".to_string(),
                |p| p.to_string_lossy().to_string(),
            )
        });

        let chunks = request.strategy.chunk(&text);
        self.store.ingest(&label, &chunks, &text)
    }

    /// Searches the store through the three-tier fallback.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for an empty query or non-positive limit.
    pub fn search(
        &self,
        query: &str,
        limit: usize,
        source: Option<&str>,
    ) -> Result<Vec<SearchHit>> {
        if query.trim().is_empty() {
            return Err(Error::bad_request("query must be non-empty"));
        }
        if limit == 0 {
            return Err(Error::bad_request("limit must be positive"));
        }
        search::search_with_fallback(&self.store, query, limit, source)
    }

    /// Lists ingested sources.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub fn list_sources(&self) -> Result<Vec<SourceSummary>> {
        self.store.list_sources()
    }

    /// Returns all chunks of one source in insertion order.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub fn chunks_by_source(&self, source_id: i64) -> Result<Vec<Chunk>> {
        self.store.chunks_by_source(source_id)
    }

    /// Returns the distinctive terms of one source.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub fn distinctive_terms(&self, source_id: i64, max_terms: usize) -> Result<Vec<String>> {
        search::distinctive_terms(&self.store, source_id, max_terms)
    }
}
