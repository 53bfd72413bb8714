//! Script materialization.
//!
//! Turns a code fragment into an on-disk script inside a fresh scratch
//! directory, applying language-specific wrapping: entry points for
//! compiled languages, the open tag for PHP, the `_build` code-path
//! preamble for Elixir, and the process-a-file preamble that exposes a
//! target file as `FILE_CONTENT` / `FILE_CONTENT_PATH`.

use crate::error::{ExecError, IoError, Result};
use crate::runtime::Language;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Creates the per-execution scratch directory.
///
/// The directory is created with restrictive permissions in the OS temp
/// dir and is removed when the returned guard drops, on every exit path
/// including panics.
///
/// # Errors
///
/// Returns [`IoError::ScratchFailed`] when the directory cannot be created.
pub fn create_scratch_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("ctxgate-")
        .tempdir()
        .map_err(|e| {
            IoError::ScratchFailed {
                reason: e.to_string(),
            }
            .into()
        })
}

/// Writes the (possibly wrapped) code fragment into the scratch directory.
///
/// # Arguments
///
/// * `scratch` - The scratch directory to write into.
/// * `language` - Language of the fragment; selects extension and wrapping.
/// * `code` - The user-supplied fragment.
/// * `target_file` - When set, process-a-file mode: a preamble reads this
///   file into `FILE_CONTENT` before the fragment runs.
///
/// # Errors
///
/// Returns [`ExecError::FileModeUnsupported`] when `target_file` is set
/// for a language without a file-mode preamble, and [`IoError`] variants
/// for filesystem failures.
pub fn materialize(
    scratch: &Path,
    language: Language,
    code: &str,
    target_file: Option<&Path>,
) -> Result<PathBuf> {
    let source = compose(language, code, target_file)?;
    let script_path = scratch.join(format!("main.{}", language.extension()));

    std::fs::write(&script_path, source).map_err(|e| IoError::WriteFailed {
        path: script_path.to_string_lossy().to_string(),
        reason: e.to_string(),
    })?;

    #[cfg(unix)]
    if language == Language::Shell {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o755);
        std::fs::set_permissions(&script_path, perms).map_err(|e| IoError::WriteFailed {
            path: script_path.to_string_lossy().to_string(),
            reason: e.to_string(),
        })?;
    }

    Ok(script_path)
}

/// Assembles preamble + wrapped fragment for one language.
fn compose(language: Language, code: &str, target_file: Option<&Path>) -> Result<String> {
    let preamble = match target_file {
        Some(target) => Some(file_preamble(language, target)?),
        None => None,
    };

    let source = match language {
        // File mode already rejected above for Go and Rust, so no
        // preamble can reach the entry-point wrappers.
        Language::Go => wrap_go(code),
        Language::Rust => wrap_rust(code),
        Language::Php => wrap_php(code, preamble.as_deref()),
        Language::Elixir => {
            // Register mix build output for code lookup in project checkouts.
            let mut source = String::from(
                "for path <- Path.wildcard(\"_build/dev/lib/*/ebin\"), do: Code.append_path(path)\n",
            );
            if let Some(p) = &preamble {
                source.push_str(p);
            }
            source.push_str(code);
            source
        }
        _ => {
            let mut source = preamble.unwrap_or_default();
            source.push_str(code);
            source
        }
    };

    Ok(source)
}

/// Escapes a path for embedding in a double-quoted string literal.
fn escape_double_quoted(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
}

/// Escapes a path for embedding in a POSIX single-quoted string.
fn escape_single_quoted(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}

/// Builds the process-a-file preamble for a language.
///
/// The target path is interpolated as a language string literal, never a
/// shell substitution, so paths containing quotes or metacharacters stay
/// inert.
fn file_preamble(language: Language, target: &Path) -> Result<String> {
    let dq = escape_double_quoted(target);
    let preamble = match language {
        Language::Python => format!(
            "FILE_CONTENT_PATH = \"{dq}\"\n\
             with open(FILE_CONTENT_PATH, \"r\", encoding=\"utf-8\", errors=\"replace\") as _f:\n\
             \x20   FILE_CONTENT = _f.read()\n"
        ),
        Language::JavaScript => format!(
            "const FILE_CONTENT_PATH = \"{dq}\";\n\
             const FILE_CONTENT = require(\"fs\").readFileSync(FILE_CONTENT_PATH, \"utf8\");\n"
        ),
        Language::TypeScript => format!(
            "import {{ readFileSync }} from \"node:fs\";\n\
             const FILE_CONTENT_PATH = \"{dq}\";\n\
             const FILE_CONTENT = readFileSync(FILE_CONTENT_PATH, \"utf8\");\n"
        ),
        Language::Shell => {
            let sq = escape_single_quoted(target);
            format!(
                "FILE_CONTENT_PATH='{sq}'\n\
                 FILE_CONTENT=\"$(cat -- \"$FILE_CONTENT_PATH\")\"\n\
                 export FILE_CONTENT FILE_CONTENT_PATH\n"
            )
        }
        Language::Ruby => format!(
            "FILE_CONTENT_PATH = \"{dq}\"\n\
             FILE_CONTENT = File.read(FILE_CONTENT_PATH)\n"
        ),
        Language::Php => format!(
            "$FILE_CONTENT_PATH = \"{dq}\";\n\
             $FILE_CONTENT = file_get_contents($FILE_CONTENT_PATH);\n"
        ),
        Language::Perl => format!(
            "our $FILE_CONTENT_PATH = \"{dq}\";\n\
             our $FILE_CONTENT = do {{ local $/; open my $fh, '<', $FILE_CONTENT_PATH or die $!; <$fh> }};\n"
        ),
        Language::R => format!(
            "FILE_CONTENT_PATH <- \"{dq}\"\n\
             FILE_CONTENT <- readChar(FILE_CONTENT_PATH, file.info(FILE_CONTENT_PATH)$size)\n"
        ),
        Language::Go | Language::Rust | Language::Elixir => {
            return Err(ExecError::FileModeUnsupported {
                language: language.tag().to_string(),
            }
            .into());
        }
    };
    Ok(preamble)
}

/// Wraps a Go fragment in a `package main` program when it lacks one.
fn wrap_go(code: &str) -> String {
    if code.contains("package ") {
        return code.to_string();
    }
    // The anchor keeps the synthesized import legal when the fragment
    // never mentions fmt.
    format!(
        "package main\n\nimport \"fmt\"\n\nvar _ = fmt.Sprint\n\nfunc main() {{\n{code}\n}}\n"
    )
}

/// Wraps a Rust fragment in `fn main` when it lacks one.
fn wrap_rust(code: &str) -> String {
    if code.contains("fn main") {
        return code.to_string();
    }
    format!("fn main() {{\n{code}\n}}\n")
}

/// Prefixes the PHP open tag when the fragment lacks one.
fn wrap_php(code: &str, preamble: Option<&str>) -> String {
    let has_tag = code.trim_start().starts_with("<?php");
    match (preamble, has_tag) {
        (Some(p), true) => format!("<?php\n{p}?>\n{code}"),
        (Some(p), false) => format!("<?php\n{p}{code}"),
        (None, true) => code.to_string(),
        (None, false) => format!("<?php\n{code}"),
    }
}
