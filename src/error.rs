//! Error types for ctxgate operations.
//!
//! This module provides the error hierarchy using `thiserror` for all
//! gateway operations including execution, storage, search, and I/O.

use thiserror::Error;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for gateway operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Execution-related errors (runtime selection, script preparation).
    #[error("execution error: {0}")]
    Exec(#[from] ExecError),

    /// Store-related errors (database operations).
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// I/O errors (scratch directories, script and content files).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Malformed request arguments.
    #[error("bad request: {message}")]
    BadRequest {
        /// Description of what was malformed.
        message: String,
    },
}

impl Error {
    /// Creates a `BadRequest` error from any displayable message.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }
}

/// Execution-specific errors raised before a child process starts.
///
/// Anything observable once a child is running is folded into the
/// execution result instead, so callers can still present partial output.
#[derive(Error, Debug)]
pub enum ExecError {
    /// Requested language has no detected runtime on this host.
    #[error("no runtime available for language: {language}")]
    LanguageUnavailable {
        /// The language tag that could not be served.
        language: String,
    },

    /// Unknown language tag on the wire.
    #[error("unknown language tag: {tag}")]
    UnknownLanguage {
        /// The unrecognized tag.
        tag: String,
    },

    /// Process-a-file mode requested for a language without a preamble.
    #[error("process-a-file mode is not supported for {language}")]
    FileModeUnsupported {
        /// The language lacking a file-mode preamble.
        language: String,
    },
}

/// Store-specific errors for database operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(String),

    /// Source not found by id.
    #[error("source not found: {id}")]
    SourceNotFound {
        /// Source id that was not found.
        id: i64,
    },

    /// Transaction error.
    #[error("transaction error: {0}")]
    Transaction(String),
}

/// I/O-specific errors for filesystem operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read a file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write a file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Scratch directory creation failed.
    #[error("failed to create scratch directory: {reason}")]
    ScratchFailed {
        /// Reason for failure.
        reason: String,
    },

    /// Memory mapping error.
    #[error("memory mapping failed: {path}: {reason}")]
    MmapFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

// Implement From traits for library errors

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(StoreError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}
