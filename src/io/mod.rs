//! I/O utilities for ctxgate.
//!
//! Document loading for ingestion, with memory mapping for large files.

pub mod reader;

pub use reader::read_document;
