//! CLI layer for ctxgate.
//!
//! Provides the command-line interface using clap, with commands for
//! executing code, ingesting documents, and querying the index.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
