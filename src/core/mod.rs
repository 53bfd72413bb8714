//! Core domain models for ctxgate.
//!
//! This module contains the fundamental data structures used throughout the
//! gateway: retrieval chunks and execution requests/results. These are pure
//! domain models with no I/O dependencies.

pub mod chunk;
pub mod exec;

pub use chunk::{Chunk, ContentKind};
pub use exec::{ExecRequest, ExecResult, Limits};
