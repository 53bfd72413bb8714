//! Execution request and result types.
//!
//! An [`ExecRequest`] describes one code fragment to run; an [`ExecResult`]
//! carries the captured, truncated output. Timeouts and output caps are
//! reported inside the result rather than as errors so callers can always
//! present partial output.

use crate::runtime::Language;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default wall-clock timeout for an execution, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default per-stream output budget after truncation (100 KiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 100 * 1024;

/// Default combined stdout+stderr buffering cap (100 MiB).
pub const DEFAULT_HARD_CAP_BYTES: usize = 100 * 1024 * 1024;

/// Output limits applied by the process supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Per-stream budget applied by smart truncation.
    pub max_output_bytes: usize,
    /// Combined raw-buffer cap; breaching it kills the process tree.
    pub hard_cap_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            hard_cap_bytes: DEFAULT_HARD_CAP_BYTES,
        }
    }
}

impl Limits {
    /// Creates limits with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-stream truncation budget.
    #[must_use]
    pub const fn with_max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    /// Sets the combined hard cap.
    #[must_use]
    pub const fn with_hard_cap_bytes(mut self, bytes: usize) -> Self {
        self.hard_cap_bytes = bytes;
        self
    }
}

/// A request to execute one code fragment.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    /// Language the fragment is written in.
    pub language: Language,

    /// The code fragment itself.
    pub code: String,

    /// Wall-clock timeout in milliseconds. Must be positive.
    pub timeout_ms: u64,

    /// Working directory override for the child process.
    pub workdir: Option<PathBuf>,

    /// Process-a-file mode: the file whose contents are exposed to the
    /// fragment as `FILE_CONTENT` / `FILE_CONTENT_PATH`.
    pub target_file: Option<PathBuf>,
}

impl ExecRequest {
    /// Creates a request with the default timeout and no overrides.
    #[must_use]
    pub fn new(language: Language, code: impl Into<String>) -> Self {
        Self {
            language,
            code: code.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            workdir: None,
            target_file: None,
        }
    }

    /// Sets the timeout in milliseconds.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Sets the working directory override.
    #[must_use]
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    /// Enables process-a-file mode against the given target.
    #[must_use]
    pub fn with_target_file(mut self, target: impl Into<PathBuf>) -> Self {
        self.target_file = Some(target.into());
        self
    }
}

/// The structured outcome of one execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Captured stdout, post-truncation.
    pub stdout: String,

    /// Captured stderr, post-truncation.
    pub stderr: String,

    /// Child exit code; 1 on timeout, signal, or spawn failure.
    pub exit_code: i32,

    /// True when the wall-clock timeout expired.
    pub timed_out: bool,

    /// True when the combined output cap was breached.
    pub output_capped: bool,
}

impl ExecResult {
    /// Returns true if the execution completed normally with exit 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out && !self.output_capped
    }

    /// Builds the result for a failure that happened before or at spawn.
    ///
    /// Per the external contract, such failures surface through
    /// `exit_code = 1` plus a diagnostic in stderr, never as a separate
    /// error channel.
    #[must_use]
    pub fn spawn_failure(diagnostic: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: diagnostic.into(),
            exit_code: 1,
            timed_out: false,
            output_capped: false,
        }
    }
}
