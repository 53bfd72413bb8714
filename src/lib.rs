//! # ctxgate
//!
//! Local gateway for LLM agents: run arbitrary code and ingest documents
//! without flooding the agent's context window.
//!
//! Two subsystems make up the core:
//!
//! - **Polyglot executor**: materializes a code fragment into a scratch
//!   directory, picks a detected interpreter or compiler, and supervises
//!   the child with timeouts, output caps, and smart truncation.
//! - **Content store**: chunks Markdown or plain text into semantic
//!   sections, persists them to an embedded full-text index, and answers
//!   queries through a three-tier fallback search (stemmed, substring,
//!   fuzzy-corrected) plus a distinctive-term extractor.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
// Note: unsafe is needed for memory-mapped I/O (memmap2) and the
// process-group kill
#![warn(unsafe_code)]

pub mod chunking;
pub mod cli;
pub mod core;
pub mod error;
pub mod gateway;
pub mod io;
pub mod runtime;
pub mod search;
pub mod store;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{Chunk, ContentKind, ExecRequest, ExecResult, Limits};

// Re-export the gateway facade
pub use gateway::{Gateway, IndexRequest};

// Re-export runtime types
pub use runtime::{Language, Runtime, RuntimeSet, SandboxWrap};

// Re-export chunking types
pub use chunking::{ChunkStrategy, chunk_markdown, chunk_plain};

// Re-export store types
pub use store::{IndexOutcome, IndexStore, SourceSummary};

// Re-export search types
pub use search::{
    DEFAULT_LIMIT, MatchLayer, SearchHit, distinctive_terms, search_with_fallback,
};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};
