//! Shell joining and the sandbox wrap hand-off.
//!
//! The gateway does not build OS confinement policies itself. When a wrap
//! callback is configured, the supervisor joins the argv into a single
//! shell-escaped string, passes it through the callback, and spawns the
//! returned string via the system shell. The callback's contract: the
//! returned string, when executed, runs the original command inside an
//! OS-level confinement documented by its provider.

use std::sync::Arc;

/// Command-wrapping callback for OS-level sandboxing.
///
/// Receives the shell-escaped command line; returns the line to actually
/// run under the system shell.
pub type SandboxWrap = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Joins an argv into one shell-safe string.
///
/// Every argument is single-quoted, with embedded single quotes escaped
/// as `'\''`. No metacharacter survives unquoted, including in filenames
/// containing spaces, quotes, or `$`.
#[must_use]
pub fn shell_join(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| format!("'{}'", arg.replace('\'', "'\\''")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds the argv that runs a wrapped command line via the system shell.
#[must_use]
pub fn shell_argv(command_line: &str) -> Vec<String> {
    #[cfg(unix)]
    {
        vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            command_line.to_string(),
        ]
    }
    #[cfg(windows)]
    {
        vec![
            "cmd".to_string(),
            "/C".to_string(),
            command_line.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(args: &[&str]) -> String {
        let argv: Vec<String> = args.iter().map(|s| (*s).to_string()).collect();
        shell_join(&argv)
    }

    #[test]
    fn test_plain_args() {
        assert_eq!(join(&["echo", "hi"]), "'echo' 'hi'");
    }

    #[test]
    fn test_spaces_and_dollars() {
        assert_eq!(
            join(&["cat", "/tmp/my file", "$HOME"]),
            "'cat' '/tmp/my file' '$HOME'"
        );
    }

    #[test]
    fn test_single_quote_escape() {
        assert_eq!(join(&["it's"]), r"'it'\''s'");
    }

    #[test]
    fn test_double_quotes_stay_literal() {
        assert_eq!(join(&[r#"say "hi""#]), r#"'say "hi"'"#);
    }

    #[test]
    fn test_empty_arg_survives() {
        assert_eq!(join(&["prog", ""]), "'prog' ''");
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_argv_unix() {
        let argv = shell_argv("'echo' 'hi'");
        assert_eq!(argv[0], "/bin/sh");
        assert_eq!(argv[1], "-c");
        assert_eq!(argv[2], "'echo' 'hi'");
    }

    #[cfg(unix)]
    #[test]
    fn test_join_round_trips_through_shell() {
        use std::process::Command;

        let tricky = vec![
            "printf".to_string(),
            "%s|%s".to_string(),
            "a b'c".to_string(),
            "$PATH".to_string(),
        ];
        let joined = shell_join(&tricky);
        let output = Command::new("/bin/sh")
            .arg("-c")
            .arg(&joined)
            .output()
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout), "a b'c|$PATH");
    }
}
