//! Process supervision: spawning, stream capture, timeouts, and caps.
//!
//! The supervisor spawns one child per execute call with stdout and
//! stderr piped, drains both streams concurrently, enforces a wall-clock
//! timeout and a combined-output hard cap (killing the whole process
//! tree on breach), and returns a structured result with head-plus-tail
//! truncation applied to each stream.

use crate::core::{ExecResult, Limits};
use crate::runtime::Plan;
use crate::runtime::sandbox::{SandboxWrap, shell_argv, shell_join};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Poll interval for child status checks.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Bound on waiting for a reader thread after the child is gone.
const READER_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Ceiling on the compile phase of compile-then-run (30 s).
const COMPILE_TIMEOUT_MS: u64 = 30_000;

/// Supervises child processes for the gateway.
pub struct Supervisor {
    limits: Limits,
    sandbox_wrap: Option<SandboxWrap>,
}

impl Supervisor {
    /// Creates a supervisor with the given output limits.
    #[must_use]
    pub const fn new(limits: Limits) -> Self {
        Self {
            limits,
            sandbox_wrap: None,
        }
    }

    /// Configures the optional command-wrapping sandbox callback.
    #[must_use]
    pub fn with_sandbox_wrap(mut self, wrap: SandboxWrap) -> Self {
        self.sandbox_wrap = Some(wrap);
        self
    }

    /// Returns the configured limits.
    #[must_use]
    pub const fn limits(&self) -> Limits {
        self.limits
    }

    /// Runs an invocation plan to completion.
    ///
    /// Compile-then-run plans first invoke the compiler with a bounded
    /// timeout; compiler failure returns exit 1 with stderr prefixed
    /// `Compilation failed:`. Everything observable after a child starts
    /// is folded into the result, never raised as an error.
    #[must_use]
    pub fn run(
        &self,
        plan: &Plan,
        workdir: &Path,
        timeout_ms: u64,
        env: &BTreeMap<String, String>,
    ) -> ExecResult {
        match plan {
            Plan::Run(argv) => self.run_argv(argv, workdir, timeout_ms, env),
            Plan::CompileThenRun { compile, binary } => {
                let compile_timeout = timeout_ms.min(COMPILE_TIMEOUT_MS);
                let compiled = self.run_argv(compile, workdir, compile_timeout, env);
                if compiled.exit_code != 0 {
                    return ExecResult {
                        stdout: compiled.stdout,
                        stderr: format!("Compilation failed:\n{}", compiled.stderr),
                        exit_code: 1,
                        timed_out: compiled.timed_out,
                        output_capped: compiled.output_capped,
                    };
                }
                let run_argv = vec![binary.to_string_lossy().to_string()];
                self.run_argv(&run_argv, workdir, timeout_ms, env)
            }
        }
    }

    /// Spawns one argv and supervises it to completion.
    fn run_argv(
        &self,
        argv: &[String],
        workdir: &Path,
        timeout_ms: u64,
        env: &BTreeMap<String, String>,
    ) -> ExecResult {
        let argv = match &self.sandbox_wrap {
            Some(wrap) => shell_argv(&wrap(&shell_join(argv))),
            None => argv.to_vec(),
        };
        if argv.is_empty() {
            return ExecResult::spawn_failure("empty command");
        }

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env_clear()
            .envs(env);

        // Own process group so the whole tree can be killed at once.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return ExecResult::spawn_failure(format!(
                    "failed to spawn {}: {e}",
                    argv[0]
                ));
            }
        };
        tracing::debug!(program = %argv[0], pid = child.id(), "spawned child");

        let tracker = Arc::new(CapTracker::new(self.limits.hard_cap_bytes));

        let stdout_pipe = child.stdout.take();
        let stdout_tracker = Arc::clone(&tracker);
        let stdout_handle = thread::spawn(move || drain_stream(stdout_pipe, &stdout_tracker));

        let stderr_pipe = child.stderr.take();
        let stderr_tracker = Arc::clone(&tracker);
        let stderr_handle = thread::spawn(move || drain_stream(stderr_pipe, &stderr_tracker));

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let mut timed_out = false;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Some(status),
                Ok(None) => {}
                Err(_) => {
                    kill_tree(&mut child);
                    break child.wait().ok();
                }
            }
            if tracker.capped() {
                tracing::warn!(pid = child.id(), "output cap breached, killing process tree");
                kill_tree(&mut child);
                break child.wait().ok();
            }
            if Instant::now() >= deadline {
                timed_out = true;
                tracing::warn!(pid = child.id(), timeout_ms, "timeout, killing process tree");
                kill_tree(&mut child);
                break child.wait().ok();
            }
            thread::sleep(POLL_INTERVAL);
        };

        let stdout_bytes = join_reader(stdout_handle);
        let stderr_bytes = join_reader(stderr_handle);
        let output_capped = tracker.capped();

        let stdout_raw = String::from_utf8_lossy(&stdout_bytes).into_owned();
        let mut stderr_raw = String::from_utf8_lossy(&stderr_bytes).into_owned();

        if output_capped {
            if !stderr_raw.is_empty() && !stderr_raw.ends_with('\n') {
                stderr_raw.push('\n');
            }
            stderr_raw.push_str(&format!(
                "output capped at {} MiB - process killed\n",
                self.limits.hard_cap_bytes / (1024 * 1024)
            ));
        }

        let exit_code = if timed_out {
            1
        } else {
            status.map_or(1, |s| s.code().unwrap_or(1))
        };

        ExecResult {
            stdout: smart_truncate(&stdout_raw, self.limits.max_output_bytes),
            stderr: smart_truncate(&stderr_raw, self.limits.max_output_bytes),
            exit_code,
            timed_out,
            output_capped,
        }
    }
}

/// Shared accounting for the combined-output hard cap.
///
/// The cap is enforced across both streams because adversarial workloads
/// can saturate either one.
struct CapTracker {
    total: AtomicUsize,
    hard_cap: usize,
    capped: AtomicBool,
}

impl CapTracker {
    const fn new(hard_cap: usize) -> Self {
        Self {
            total: AtomicUsize::new(0),
            hard_cap,
            capped: AtomicBool::new(false),
        }
    }

    fn record(&self, n: usize) -> bool {
        let total = self.total.fetch_add(n, Ordering::SeqCst) + n;
        if total > self.hard_cap {
            self.capped.store(true, Ordering::SeqCst);
        }
        self.capped.load(Ordering::SeqCst)
    }

    fn capped(&self) -> bool {
        self.capped.load(Ordering::SeqCst)
    }
}

/// Drains one pipe into a buffer, honoring the shared cap.
///
/// After a cap breach the stream keeps draining (so the child is not
/// blocked on a full pipe before the kill lands) but stops buffering.
fn drain_stream<R: Read>(pipe: Option<R>, tracker: &CapTracker) -> Vec<u8> {
    let mut buf = Vec::new();
    let Some(mut reader) = pipe else {
        return buf;
    };
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let capped = tracker.record(n);
                if !capped {
                    buf.extend_from_slice(&chunk[..n]);
                }
            }
        }
    }
    buf
}

/// Joins a reader thread with a bounded wait so a wedged pipe cannot
/// hang the supervisor.
fn join_reader(handle: thread::JoinHandle<Vec<u8>>) -> Vec<u8> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(handle.join());
    });
    match rx.recv_timeout(READER_JOIN_TIMEOUT) {
        Ok(Ok(buf)) => buf,
        _ => Vec::new(),
    }
}

/// Kills a child and all of its descendants.
///
/// The direct child's PID alone is insufficient: a shell launcher may
/// have spawned grandchildren.
#[cfg(unix)]
#[allow(unsafe_code)]
fn kill_tree(child: &mut Child) {
    #[allow(clippy::cast_possible_wrap)]
    let pid = child.id() as i32;
    // The child was placed in its own process group at spawn; the group
    // id equals the child pid.
    unsafe {
        libc::killpg(pid, libc::SIGKILL);
    }
    let _ = child.kill();
}

#[cfg(windows)]
fn kill_tree(child: &mut Child) {
    let _ = Command::new("taskkill")
        .args(["/T", "/F", "/PID", &child.id().to_string()])
        .output();
    let _ = child.kill();
}

/// Applies smart head-plus-tail truncation to one stream.
///
/// When the raw length exceeds `max_output_bytes`, the first 60% and the
/// last 40% of the budget are retained, each snapped to line boundaries,
/// separated by a single notice line stating the skipped line and byte
/// counts. Errors and final results usually appear near the tail, while
/// initial setup context lives at the head.
#[must_use]
pub fn smart_truncate(raw: &str, max_output_bytes: usize) -> String {
    if raw.len() <= max_output_bytes || max_output_bytes == 0 {
        return raw.to_string();
    }

    let head_budget = max_output_bytes * 60 / 100;
    let tail_budget = max_output_bytes - head_budget;
    let bytes = raw.as_bytes();

    let head_end = bytes[..head_budget]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or_else(|| floor_boundary(raw, head_budget), |pos| pos + 1);

    let tail_candidate = raw.len() - tail_budget;
    let tail_start = bytes[tail_candidate..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or_else(
            || ceil_boundary(raw, tail_candidate),
            |pos| tail_candidate + pos + 1,
        );

    let head = &raw[..head_end];
    let tail = &raw[tail_start..];
    let skipped_bytes = raw.len() - head.len() - tail.len();
    let skipped_lines = bytes[head_end..tail_start]
        .iter()
        .filter(|&&b| b == b'\n')
        .count();

    let mut out = String::with_capacity(head.len() + tail.len() + 64);
    out.push_str(head);
    if !head.is_empty() && !head.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!(
        "[... {skipped_lines} lines / {skipped_bytes} bytes truncated ...]\n"
    ));
    out.push_str(tail);
    out
}

/// Largest char boundary at or below `i`.
fn floor_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest char boundary at or above `i`.
fn ceil_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_string()).collect()
    }

    fn run_shell(script: &str, limits: Limits, timeout_ms: u64) -> ExecResult {
        let supervisor = Supervisor::new(limits);
        let env = crate::runtime::build_child_env(
            crate::runtime::Language::Shell,
            Path::new("/tmp"),
        );
        supervisor.run(
            &Plan::Run(argv(&["/bin/sh", "-c", script])),
            Path::new("/tmp"),
            timeout_ms,
            &env,
        )
    }

    #[test]
    fn test_smart_truncate_untouched_below_budget() {
        assert_eq!(smart_truncate("short\n", 100), "short\n");
    }

    #[test]
    fn test_smart_truncate_head_and_tail() {
        let raw: String = (1..=1000).map(|n| format!("line {n}\n")).collect();
        let out = smart_truncate(&raw, 500);

        assert!(out.starts_with("line 1\n"));
        assert!(out.ends_with("line 1000\n"));
        assert!(out.contains("lines /"));
        assert!(out.contains("truncated"));
        // Exactly one notice line
        assert_eq!(out.matches("truncated ...]").count(), 1);
    }

    #[test]
    fn test_smart_truncate_byte_bound() {
        let raw: String = (1..=10_000).map(|n| format!("line {n}\n")).collect();
        let max = 1000;
        let out = smart_truncate(&raw, max);
        // Budget plus one notice line of slack
        assert!(out.len() <= max + 80, "output length {} over bound", out.len());
    }

    #[test]
    fn test_smart_truncate_snaps_to_line_boundaries() {
        let raw: String = (1..=1000).map(|n| format!("line {n}\n")).collect();
        let out = smart_truncate(&raw, 500);
        let notice_pos = out.find("[...").unwrap();
        assert_eq!(&out[notice_pos - 1..notice_pos], "\n");
        for line in out.lines().take(3) {
            assert!(line.starts_with("line ") || line.starts_with("[..."));
        }
    }

    #[test]
    fn test_smart_truncate_no_newlines() {
        let raw = "x".repeat(1000);
        let out = smart_truncate(&raw, 100);
        assert!(out.contains("truncated"));
        assert!(out.len() <= 100 + 80);
    }

    #[test]
    fn test_smart_truncate_multibyte_safe() {
        let raw = "é".repeat(1000);
        let out = smart_truncate(&raw, 101);
        // Must not split a two-byte character
        assert!(out.contains("truncated"));
        let _ = out.chars().count();
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_stdout_and_exit() {
        let result = run_shell("echo hello; exit 0", Limits::default(), 10_000);
        assert_eq!(result.stdout, "hello\n");
        assert_eq!(result.exit_code, 0);
        assert!(!result.timed_out);
        assert!(!result.output_capped);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_stderr() {
        let result = run_shell("echo oops >&2; exit 3", Limits::default(), 10_000);
        assert_eq!(result.stderr, "oops\n");
        assert_eq!(result.exit_code, 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_and_reports() {
        let start = Instant::now();
        let result = run_shell("sleep 30", Limits::default(), 300);
        assert!(result.timed_out);
        assert_eq!(result.exit_code, 1);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_grandchildren() {
        // The inner sleep is a grandchild of the supervised shell.
        let start = Instant::now();
        let result = run_shell("sh -c 'sleep 30' & wait", Limits::default(), 300);
        assert!(result.timed_out);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_hard_cap_kills_and_notices() {
        let limits = Limits::new().with_hard_cap_bytes(1024 * 1024);
        let result = run_shell("yes", limits, 60_000);
        assert!(result.output_capped);
        assert_eq!(result.exit_code, 1);
        assert!(result.stderr.contains("output capped at 1 MiB"));
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_failure_folds_into_result() {
        let supervisor = Supervisor::new(Limits::default());
        let env = BTreeMap::new();
        let result = supervisor.run(
            &Plan::Run(argv(&["/nonexistent/interpreter", "x"])),
            Path::new("/tmp"),
            1_000,
            &env,
        );
        assert_eq!(result.exit_code, 1);
        assert!(result.stderr.contains("failed to spawn"));
    }

    #[cfg(unix)]
    #[test]
    fn test_environment_is_sanitized() {
        let result = run_shell("printf '%s' \"$NO_COLOR:$LANG\"", Limits::default(), 10_000);
        assert_eq!(result.stdout, "1:en_US.UTF-8");
    }

    #[cfg(unix)]
    #[test]
    fn test_sandbox_wrap_receives_joined_command() {
        use std::sync::Mutex;

        let seen: Arc<Mutex<String>> = Arc::new(Mutex::new(String::new()));
        let seen_clone = Arc::clone(&seen);
        let wrap: SandboxWrap = Arc::new(move |cmd: &str| {
            *seen_clone.lock().unwrap() = cmd.to_string();
            cmd.to_string()
        });

        let supervisor = Supervisor::new(Limits::default()).with_sandbox_wrap(wrap);
        let env = crate::runtime::build_child_env(
            crate::runtime::Language::Shell,
            Path::new("/tmp"),
        );
        let result = supervisor.run(
            &Plan::Run(argv(&["/bin/echo", "a b"])),
            Path::new("/tmp"),
            10_000,
            &env,
        );
        assert_eq!(result.stdout, "a b\n");
        assert_eq!(&*seen.lock().unwrap(), "'/bin/echo' 'a b'");
    }

    #[test]
    fn test_compile_failure_prefix() {
        // A "compiler" that always fails stands in for rustc.
        #[cfg(unix)]
        {
            let supervisor = Supervisor::new(Limits::default());
            let env = BTreeMap::new();
            let plan = Plan::CompileThenRun {
                compile: argv(&["/bin/sh", "-c", "echo boom >&2; exit 1"]),
                binary: std::path::PathBuf::from("/tmp/never-built"),
            };
            let result = supervisor.run(&plan, Path::new("/tmp"), 10_000, &env);
            assert_eq!(result.exit_code, 1);
            assert!(result.stderr.starts_with("Compilation failed:"));
            assert!(result.stderr.contains("boom"));
        }
    }
}
