//! Child-process environment synthesis.
//!
//! Children never inherit the parent environment wholesale. A minimum
//! safe set is synthesized, then extended by an explicit pass-through
//! allow-list of credential-carrying variables developer CLIs rely on.
//! Anything else is dropped.

use crate::runtime::Language;
use std::collections::BTreeMap;
use std::path::Path;

/// Variables passed through from the parent when present.
///
/// The list covers VCS host tokens, cloud SDK credentials, proxy
/// settings, and XDG paths. It is a floor: deployments may extend it.
pub const PASS_THROUGH_ENV: &[&str] = &[
    "GITHUB_TOKEN",
    "GH_TOKEN",
    "GITLAB_TOKEN",
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "AWS_REGION",
    "AWS_DEFAULT_REGION",
    "GOOGLE_APPLICATION_CREDENTIALS",
    "HTTP_PROXY",
    "HTTPS_PROXY",
    "NO_PROXY",
    "http_proxy",
    "https_proxy",
    "no_proxy",
    "XDG_CONFIG_HOME",
    "XDG_DATA_HOME",
    "XDG_CACHE_HOME",
    "SSH_AUTH_SOCK",
];

/// Windows-only supplement (system root, command processor, profile).
#[cfg(windows)]
pub const WINDOWS_ENV: &[&str] = &[
    "SYSTEMROOT",
    "SYSTEMDRIVE",
    "COMSPEC",
    "WINDIR",
    "USERPROFILE",
    "APPDATA",
    "LOCALAPPDATA",
    "PROGRAMDATA",
    "PATHEXT",
    "TEMP",
    "TMP",
];

/// Platform default search path used when the parent has no `PATH`.
#[cfg(unix)]
const DEFAULT_PATH: &str = "/usr/local/bin:/usr/bin:/bin:/usr/sbin:/sbin";
#[cfg(windows)]
const DEFAULT_PATH: &str = "C:\\Windows\\System32;C:\\Windows";

/// Builds the environment map for one child process.
///
/// # Arguments
///
/// * `language` - The language being executed (drives buffering hints).
/// * `scratch_dir` - The per-execution scratch directory (becomes `TMPDIR`).
#[must_use]
pub fn build_child_env(language: Language, scratch_dir: &Path) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();

    env.insert(
        "PATH".to_string(),
        std::env::var("PATH").unwrap_or_else(|_| DEFAULT_PATH.to_string()),
    );
    if let Ok(home) = std::env::var("HOME") {
        env.insert("HOME".to_string(), home);
    }
    env.insert(
        "TMPDIR".to_string(),
        scratch_dir.to_string_lossy().to_string(),
    );
    env.insert("LANG".to_string(), "en_US.UTF-8".to_string());
    env.insert("NO_COLOR".to_string(), "1".to_string());

    // Byte-code and buffering hints
    if language == Language::Python {
        env.insert("PYTHONUNBUFFERED".to_string(), "1".to_string());
        env.insert("PYTHONDONTWRITEBYTECODE".to_string(), "1".to_string());
    }

    for key in PASS_THROUGH_ENV {
        if let Ok(value) = std::env::var(key) {
            env.insert((*key).to_string(), value);
        }
    }

    #[cfg(windows)]
    for key in WINDOWS_ENV {
        if let Ok(value) = std::env::var(key) {
            env.insert((*key).to_string(), value);
        }
    }

    env
}

#[cfg(test)]
// set_var/remove_var are unsafe in edition 2024; these tests serialize
// access by touching keys no other test reads.
#[allow(unsafe_code)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_keys_present() {
        let env = build_child_env(Language::Shell, Path::new("/tmp/scratch"));
        assert!(env.contains_key("PATH"));
        assert_eq!(env.get("TMPDIR").map(String::as_str), Some("/tmp/scratch"));
        assert_eq!(env.get("LANG").map(String::as_str), Some("en_US.UTF-8"));
        assert_eq!(env.get("NO_COLOR").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_python_hints() {
        let env = build_child_env(Language::Python, Path::new("/tmp/s"));
        assert_eq!(env.get("PYTHONUNBUFFERED").map(String::as_str), Some("1"));
        assert_eq!(
            env.get("PYTHONDONTWRITEBYTECODE").map(String::as_str),
            Some("1")
        );

        let env = build_child_env(Language::Ruby, Path::new("/tmp/s"));
        assert!(!env.contains_key("PYTHONUNBUFFERED"));
    }

    #[test]
    fn test_unlisted_variables_dropped() {
        // SAFETY: test-local mutation; no other thread reads this key.
        unsafe {
            std::env::set_var("CTXGATE_TEST_SECRET", "value");
        }
        let env = build_child_env(Language::Shell, Path::new("/tmp/s"));
        assert!(!env.contains_key("CTXGATE_TEST_SECRET"));
        unsafe {
            std::env::remove_var("CTXGATE_TEST_SECRET");
        }
    }

    #[test]
    fn test_allow_list_passes_through() {
        unsafe {
            std::env::set_var("GITLAB_TOKEN", "glpat-test");
        }
        let env = build_child_env(Language::Shell, Path::new("/tmp/s"));
        assert_eq!(env.get("GITLAB_TOKEN").map(String::as_str), Some("glpat-test"));
        unsafe {
            std::env::remove_var("GITLAB_TOKEN");
        }
    }
}
