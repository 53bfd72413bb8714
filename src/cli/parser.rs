//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ctxgate: local gateway for LLM agents.
///
/// Runs code fragments in sandboxed scratch directories and ingests
/// documents into an ephemeral full-text index with fallback search.
#[derive(Parser, Debug)]
#[command(name = "ctxgate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the index database file.
    ///
    /// Defaults to a per-process file in the OS temp dir, removed on
    /// exit. Point this at a stable path to keep an index across runs.
    #[arg(long, env = "CTXGATE_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Enable verbose diagnostics on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a code fragment.
    Run {
        /// Language tag (javascript, typescript, python, shell, ruby,
        /// go, rust, php, perl, r, elixir).
        language: String,

        /// The code to run (reads from stdin when omitted).
        code: Option<String>,

        /// Read the code from a file instead.
        #[arg(long, conflicts_with = "code")]
        code_file: Option<PathBuf>,

        /// Wall-clock timeout in milliseconds.
        #[arg(long, default_value = "30000")]
        timeout_ms: u64,

        /// Working directory for the child process.
        #[arg(long)]
        workdir: Option<PathBuf>,

        /// Process-a-file mode: expose this file as FILE_CONTENT.
        #[arg(long)]
        file_target: Option<PathBuf>,

        /// Index the captured stdout under this source label.
        #[arg(long)]
        index_as: Option<String>,
    },

    /// Ingest content into the index.
    Index {
        /// Inline content (wins over --path when both are given).
        #[arg(long)]
        content: Option<String>,

        /// File to ingest.
        #[arg(long)]
        path: Option<PathBuf>,

        /// Source label (defaults to the path, else "untitled").
        #[arg(long)]
        label: Option<String>,

        /// Chunking mode (markdown, text).
        #[arg(long, default_value = "markdown")]
        mode: String,
    },

    /// Search the index with three-tier fallback.
    Search {
        /// The query.
        query: String,

        /// Maximum number of results.
        #[arg(short = 'n', long, default_value = "3")]
        limit: usize,

        /// Restrict to sources whose label contains this substring.
        #[arg(long)]
        source: Option<String>,
    },

    /// List ingested sources.
    Sources,

    /// Show all chunks of one source in insertion order.
    Chunks {
        /// Source id.
        source_id: i64,
    },

    /// Show the distinctive terms of one source.
    Terms {
        /// Source id.
        source_id: i64,

        /// Maximum number of terms.
        #[arg(long, default_value = "40")]
        max_terms: usize,
    },

    /// List detected language runtimes.
    Runtimes,
}
