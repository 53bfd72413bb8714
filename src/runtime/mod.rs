//! Language runtimes: detection and invocation planning.
//!
//! On gateway construction the detector probes `PATH` once for every
//! supported language and records an invocation template. The resulting
//! [`RuntimeSet`] is immutable; all later execution decisions are lookups.

pub mod env;
pub mod sandbox;
pub mod script;
pub mod supervisor;

pub use env::build_child_env;
pub use sandbox::{SandboxWrap, shell_join};
pub use script::{create_scratch_dir, materialize};
pub use supervisor::{Supervisor, smart_truncate};

use crate::error::ExecError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder replaced by the absolute script path at invocation time.
pub const SCRIPT_PLACEHOLDER: &str = "{script}";

/// Placeholder replaced by the compiled-binary path (compile-then-run).
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// The closed set of supported languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// JavaScript (bun preferred, node fallback).
    JavaScript,
    /// TypeScript (bun preferred, deno fallback).
    TypeScript,
    /// Python 3.
    Python,
    /// POSIX shell (bash preferred).
    Shell,
    /// Ruby.
    Ruby,
    /// Go, run through `go run`.
    Go,
    /// Rust, routed through compile-then-run.
    Rust,
    /// PHP.
    Php,
    /// Perl.
    Perl,
    /// R, run through `Rscript`.
    R,
    /// Elixir.
    Elixir,
}

impl Language {
    /// Every supported language, in a stable order.
    pub const ALL: [Self; 11] = [
        Self::JavaScript,
        Self::TypeScript,
        Self::Python,
        Self::Shell,
        Self::Ruby,
        Self::Go,
        Self::Rust,
        Self::Php,
        Self::Perl,
        Self::R,
        Self::Elixir,
    ];

    /// Canonical wire tag for this language.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Python => "python",
            Self::Shell => "shell",
            Self::Ruby => "ruby",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Php => "php",
            Self::Perl => "perl",
            Self::R => "r",
            Self::Elixir => "elixir",
        }
    }

    /// Script file extension for this language.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::JavaScript => "js",
            Self::TypeScript => "ts",
            Self::Python => "py",
            Self::Shell => "sh",
            Self::Ruby => "rb",
            Self::Go => "go",
            Self::Rust => "rs",
            Self::Php => "php",
            Self::Perl => "pl",
            Self::R => "R",
            Self::Elixir => "exs",
        }
    }

    /// Parses a wire tag, accepting the common aliases.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::UnknownLanguage`] for unrecognized tags.
    pub fn from_tag(tag: &str) -> Result<Self, ExecError> {
        match tag.to_ascii_lowercase().as_str() {
            "javascript" | "js" | "node" => Ok(Self::JavaScript),
            "typescript" | "ts" => Ok(Self::TypeScript),
            "python" | "py" | "python3" => Ok(Self::Python),
            "shell" | "bash" | "sh" => Ok(Self::Shell),
            "ruby" | "rb" => Ok(Self::Ruby),
            "go" | "golang" => Ok(Self::Go),
            "rust" | "rs" => Ok(Self::Rust),
            "php" => Ok(Self::Php),
            "perl" | "pl" => Ok(Self::Perl),
            "r" | "rscript" => Ok(Self::R),
            "elixir" | "exs" => Ok(Self::Elixir),
            _ => Err(ExecError::UnknownLanguage {
                tag: tag.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// How a detected runtime is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Invocation {
    /// No runtime found on `PATH`.
    Missing,
    /// Interpreter argv containing [`SCRIPT_PLACEHOLDER`].
    Interpreter(Vec<String>),
    /// Sentinel routed through the compile-then-run path. The compiler
    /// argv contains [`SCRIPT_PLACEHOLDER`] and [`OUTPUT_PLACEHOLDER`].
    CompileAndRun {
        /// Compiler argv template.
        compiler: Vec<String>,
    },
}

/// A detected language runtime. Immutable after detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
    /// The language this runtime serves.
    pub language: Language,
    /// Whether a usable interpreter/compiler was found.
    pub available: bool,
    /// Invocation template.
    pub invocation: Invocation,
}

/// A concrete invocation plan for one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Run the argv directly.
    Run(Vec<String>),
    /// Compile first, then run the produced binary.
    CompileThenRun {
        /// Fully substituted compiler argv.
        compile: Vec<String>,
        /// Path the compiler writes and the run step executes.
        binary: std::path::PathBuf,
    },
}

impl Invocation {
    /// Resolves the template against a concrete script path.
    ///
    /// Returns `None` when the runtime is missing.
    #[must_use]
    pub fn resolve(&self, script: &Path) -> Option<Plan> {
        let script_str = script.to_string_lossy();
        match self {
            Self::Missing => None,
            Self::Interpreter(argv) => Some(Plan::Run(
                argv.iter()
                    .map(|a| a.replace(SCRIPT_PLACEHOLDER, &script_str))
                    .collect(),
            )),
            Self::CompileAndRun { compiler } => {
                let binary = script
                    .with_file_name(format!("main-bin{}", std::env::consts::EXE_SUFFIX));
                let binary_str = binary.to_string_lossy().to_string();
                let compile = compiler
                    .iter()
                    .map(|a| {
                        a.replace(SCRIPT_PLACEHOLDER, &script_str)
                            .replace(OUTPUT_PLACEHOLDER, &binary_str)
                    })
                    .collect();
                Some(Plan::CompileThenRun { compile, binary })
            }
        }
    }
}

/// The per-process map of detected runtimes.
///
/// Detection is a pure function of the environment: it reads `PATH`,
/// touches nothing, and is idempotent.
#[derive(Debug, Clone)]
pub struct RuntimeSet {
    runtimes: Vec<Runtime>,
}

impl RuntimeSet {
    /// Probes the environment for every supported language.
    #[must_use]
    pub fn detect() -> Self {
        let runtimes = Language::ALL
            .iter()
            .map(|&language| {
                let invocation = probe(language);
                let available = invocation != Invocation::Missing;
                tracing::debug!(%language, available, "runtime probe");
                Runtime {
                    language,
                    available,
                    invocation,
                }
            })
            .collect();
        Self { runtimes }
    }

    /// Looks up the runtime for a language.
    #[must_use]
    pub fn get(&self, language: Language) -> &Runtime {
        // ALL and the runtimes vec share one ordering, so the position
        // lookup cannot miss.
        self.runtimes
            .iter()
            .find(|r| r.language == language)
            .unwrap_or(&MISSING_RUNTIME)
    }

    /// Returns true when the language has a usable runtime.
    #[must_use]
    pub fn is_available(&self, language: Language) -> bool {
        self.get(language).available
    }

    /// Iterates over all runtimes in detection order.
    pub fn iter(&self) -> impl Iterator<Item = &Runtime> {
        self.runtimes.iter()
    }
}

static MISSING_RUNTIME: Runtime = Runtime {
    language: Language::Rust,
    available: false,
    invocation: Invocation::Missing,
};

/// Finds the first candidate program present on `PATH` and builds its argv.
fn first_found(candidates: &[(&str, &[&str])]) -> Invocation {
    for (program, template) in candidates {
        if let Ok(path) = which::which(program) {
            let mut argv: Vec<String> =
                template.iter().map(|a| (*a).to_string()).collect();
            argv[0] = path.to_string_lossy().to_string();
            return Invocation::Interpreter(argv);
        }
    }
    Invocation::Missing
}

/// Probes one language, returning its invocation template.
fn probe(language: Language) -> Invocation {
    match language {
        Language::JavaScript => first_found(&[
            // bun is the preferred faster runtime when present
            ("bun", &["bun", "run", SCRIPT_PLACEHOLDER]),
            ("node", &["node", SCRIPT_PLACEHOLDER]),
        ]),
        Language::TypeScript => first_found(&[
            ("bun", &["bun", "run", SCRIPT_PLACEHOLDER]),
            ("deno", &["deno", "run", "--allow-all", SCRIPT_PLACEHOLDER]),
        ]),
        Language::Python => first_found(&[
            ("python3", &["python3", SCRIPT_PLACEHOLDER]),
            ("python", &["python", SCRIPT_PLACEHOLDER]),
        ]),
        Language::Shell => first_found(&[
            ("bash", &["bash", SCRIPT_PLACEHOLDER]),
            ("sh", &["sh", SCRIPT_PLACEHOLDER]),
        ]),
        Language::Ruby => first_found(&[("ruby", &["ruby", SCRIPT_PLACEHOLDER])]),
        Language::Go => first_found(&[("go", &["go", "run", SCRIPT_PLACEHOLDER])]),
        Language::Rust => match which::which("rustc") {
            Ok(path) => Invocation::CompileAndRun {
                compiler: vec![
                    path.to_string_lossy().to_string(),
                    SCRIPT_PLACEHOLDER.to_string(),
                    "-o".to_string(),
                    OUTPUT_PLACEHOLDER.to_string(),
                ],
            },
            Err(_) => Invocation::Missing,
        },
        Language::Php => first_found(&[("php", &["php", SCRIPT_PLACEHOLDER])]),
        Language::Perl => first_found(&[("perl", &["perl", SCRIPT_PLACEHOLDER])]),
        Language::R => first_found(&[("Rscript", &["Rscript", SCRIPT_PLACEHOLDER])]),
        Language::Elixir => first_found(&[("elixir", &["elixir", SCRIPT_PLACEHOLDER])]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag_aliases() {
        assert_eq!(Language::from_tag("js").unwrap(), Language::JavaScript);
        assert_eq!(Language::from_tag("TS").unwrap(), Language::TypeScript);
        assert_eq!(Language::from_tag("python3").unwrap(), Language::Python);
        assert_eq!(Language::from_tag("bash").unwrap(), Language::Shell);
        assert_eq!(Language::from_tag("golang").unwrap(), Language::Go);
        assert_eq!(Language::from_tag("exs").unwrap(), Language::Elixir);
    }

    #[test]
    fn test_from_tag_unknown() {
        let err = Language::from_tag("cobol").unwrap_err();
        assert!(matches!(err, ExecError::UnknownLanguage { .. }));
    }

    #[test]
    fn test_tag_roundtrip() {
        for language in Language::ALL {
            assert_eq!(Language::from_tag(language.tag()).unwrap(), language);
        }
    }

    #[test]
    fn test_extensions_distinct_per_language() {
        let mut extensions: Vec<&str> =
            Language::ALL.iter().map(|l| l.extension()).collect();
        extensions.sort_unstable();
        extensions.dedup();
        assert_eq!(extensions.len(), Language::ALL.len());
    }

    #[test]
    fn test_detect_covers_all_languages() {
        let set = RuntimeSet::detect();
        assert_eq!(set.iter().count(), Language::ALL.len());
        for language in Language::ALL {
            assert_eq!(set.get(language).language, language);
        }
    }

    #[test]
    fn test_detect_idempotent() {
        let first = RuntimeSet::detect();
        let second = RuntimeSet::detect();
        for language in Language::ALL {
            assert_eq!(
                first.get(language).available,
                second.get(language).available
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_detected_on_unix() {
        let set = RuntimeSet::detect();
        assert!(set.is_available(Language::Shell));
    }

    #[test]
    fn test_resolve_interpreter() {
        let invocation = Invocation::Interpreter(vec![
            "/usr/bin/python3".to_string(),
            SCRIPT_PLACEHOLDER.to_string(),
        ]);
        let plan = invocation.resolve(Path::new("/tmp/work/main.py")).unwrap();
        assert_eq!(
            plan,
            Plan::Run(vec![
                "/usr/bin/python3".to_string(),
                "/tmp/work/main.py".to_string(),
            ])
        );
    }

    #[test]
    fn test_resolve_compile_and_run() {
        let invocation = Invocation::CompileAndRun {
            compiler: vec![
                "rustc".to_string(),
                SCRIPT_PLACEHOLDER.to_string(),
                "-o".to_string(),
                OUTPUT_PLACEHOLDER.to_string(),
            ],
        };
        let plan = invocation.resolve(Path::new("/tmp/work/main.rs")).unwrap();
        match plan {
            Plan::CompileThenRun { compile, binary } => {
                assert_eq!(compile[1], "/tmp/work/main.rs");
                assert!(binary.to_string_lossy().contains("main-bin"));
                assert_eq!(compile[3], binary.to_string_lossy());
            }
            Plan::Run(_) => panic!("expected compile-then-run plan"),
        }
    }

    #[test]
    fn test_resolve_missing() {
        assert!(Invocation::Missing.resolve(Path::new("/tmp/x.py")).is_none());
    }
}
