//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::core::{Chunk, ExecResult};
use crate::error::Error;
use crate::runtime::{Invocation, Runtime};
use crate::search::SearchHit;
use crate::store::{IndexOutcome, SourceSummary};
use serde::Serialize;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Serializes any value to pretty JSON.
fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .map_or_else(|e| format!("{{\"error\": \"{e}\"}}"), |mut s| {
            s.push('\n');
            s
        })
}

/// Formats an execution result.
#[must_use]
pub fn format_exec_result(result: &ExecResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(result),
        OutputFormat::Text => {
            let mut out = String::new();
            if !result.stdout.is_empty() {
                out.push_str(&result.stdout);
                if !result.stdout.ends_with('\n') {
                    out.push('\n');
                }
            }
            if !result.stderr.is_empty() {
                let _ = writeln!(out, "--- stderr ---");
                out.push_str(&result.stderr);
                if !result.stderr.ends_with('\n') {
                    out.push('\n');
                }
            }
            let _ = writeln!(out, "exit: {}", result.exit_code);
            if result.timed_out {
                let _ = writeln!(out, "timed out");
            }
            if result.output_capped {
                let _ = writeln!(out, "output capped");
            }
            out
        }
    }
}

/// Formats an ingestion outcome.
#[must_use]
pub fn format_index_outcome(outcome: &IndexOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(outcome),
        OutputFormat::Text => format!(
            "indexed source {} ({}): {} chunks ({} code)\n",
            outcome.source_id, outcome.label, outcome.chunk_count, outcome.code_chunk_count
        ),
    }
}

/// Formats search hits.
#[must_use]
pub fn format_hits(hits: &[SearchHit], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&hits),
        OutputFormat::Text => {
            if hits.is_empty() {
                return "No results.\n".to_string();
            }
            let mut out = String::new();
            for (i, hit) in hits.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "{}. [{}] {} (source: {}, rank {:.3}, {})",
                    i + 1,
                    hit.layer,
                    hit.title,
                    hit.source_label,
                    hit.rank,
                    hit.kind
                );
                for line in hit.body.lines().take(6) {
                    let _ = writeln!(out, "   {line}");
                }
                if hit.body.lines().count() > 6 {
                    let _ = writeln!(out, "   ...");
                }
            }
            out
        }
    }
}

/// Formats the source listing.
#[must_use]
pub fn format_sources(sources: &[SourceSummary], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&sources),
        OutputFormat::Text => {
            if sources.is_empty() {
                return "No sources indexed.\n".to_string();
            }
            let mut out = String::new();
            let _ = writeln!(out, "{:<6} {:<40} {:<8} Code", "ID", "Label", "Chunks");
            out.push_str(&"-".repeat(64));
            out.push('\n');
            for source in sources {
                let _ = writeln!(
                    out,
                    "{:<6} {:<40} {:<8} {}",
                    source.id,
                    truncate(&source.label, 40),
                    source.chunk_count,
                    source.code_chunk_count
                );
            }
            out
        }
    }
}

/// Formats the chunks of one source.
#[must_use]
pub fn format_chunks(chunks: &[Chunk], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&chunks),
        OutputFormat::Text => {
            if chunks.is_empty() {
                return "No chunks.\n".to_string();
            }
            let mut out = String::new();
            for (i, chunk) in chunks.iter().enumerate() {
                let _ = writeln!(out, "[{}] {} ({})", i, chunk.title, chunk.kind);
                out.push_str(&chunk.body);
                out.push('\n');
                out.push('\n');
            }
            out
        }
    }
}

/// Formats the distinctive terms of one source.
#[must_use]
pub fn format_terms(terms: &[String], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => format_json(&terms),
        OutputFormat::Text => {
            if terms.is_empty() {
                "No distinctive terms.\n".to_string()
            } else {
                let mut out = terms.join(" ");
                out.push('\n');
                out
            }
        }
    }
}

/// Formats the runtime listing.
#[must_use]
pub fn format_runtimes<'a, I>(runtimes: I, format: OutputFormat) -> String
where
    I: Iterator<Item = &'a Runtime>,
{
    let runtimes: Vec<&Runtime> = runtimes.collect();
    match format {
        OutputFormat::Json => format_json(&runtimes),
        OutputFormat::Text => {
            let mut out = String::new();
            let _ = writeln!(out, "{:<12} {:<10} Command", "Language", "Available");
            out.push_str(&"-".repeat(48));
            out.push('\n');
            for runtime in runtimes {
                let command = match &runtime.invocation {
                    Invocation::Missing => "-".to_string(),
                    Invocation::Interpreter(argv) => argv.join(" "),
                    Invocation::CompileAndRun { compiler } => {
                        format!("{} (compile+run)", compiler.join(" "))
                    }
                };
                let _ = writeln!(
                    out,
                    "{:<12} {:<10} {}",
                    runtime.language.tag(),
                    if runtime.available { "yes" } else { "no" },
                    command
                );
            }
            out
        }
    }
}

/// Formats an error for the chosen output format.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ErrorPayload {
                error: String,
            }
            format_json(&ErrorPayload {
                error: error.to_string(),
            })
        }
        OutputFormat::Text => error.to_string(),
    }
}

/// Truncates a string for table display.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ContentKind;
    use crate::search::MatchLayer;

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("bogus"), OutputFormat::Text);
    }

    #[test]
    fn test_format_exec_result_text() {
        let result = ExecResult {
            stdout: "hello\n".to_string(),
            stderr: "warn\n".to_string(),
            exit_code: 0,
            timed_out: false,
            output_capped: false,
        };
        let out = format_exec_result(&result, OutputFormat::Text);
        assert!(out.contains("hello"));
        assert!(out.contains("--- stderr ---"));
        assert!(out.contains("exit: 0"));
        assert!(!out.contains("timed out"));
    }

    #[test]
    fn test_format_exec_result_json() {
        let result = ExecResult {
            stdout: "x".to_string(),
            exit_code: 1,
            timed_out: true,
            ..Default::default()
        };
        let out = format_exec_result(&result, OutputFormat::Json);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["exit_code"], 1);
        assert_eq!(parsed["timed_out"], true);
    }

    #[test]
    fn test_format_hits_text() {
        let hits = vec![SearchHit {
            title: "Setup".to_string(),
            body: "install things".to_string(),
            source_label: "guide.md".to_string(),
            rank: -1.25,
            kind: ContentKind::Prose,
            layer: MatchLayer::Stemmed,
        }];
        let out = format_hits(&hits, OutputFormat::Text);
        assert!(out.contains("[stemmed] Setup"));
        assert!(out.contains("guide.md"));
    }

    #[test]
    fn test_format_hits_empty() {
        assert_eq!(format_hits(&[], OutputFormat::Text), "No results.\n");
    }

    #[test]
    fn test_format_sources_table() {
        let sources = vec![SourceSummary {
            id: 1,
            label: "docs".to_string(),
            chunk_count: 4,
            code_chunk_count: 1,
        }];
        let out = format_sources(&sources, OutputFormat::Text);
        assert!(out.contains("docs"));
        assert!(out.contains('4'));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("0123456789x", 10), "0123456...");
    }
}
