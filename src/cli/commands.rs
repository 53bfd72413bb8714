//! CLI command implementations.
//!
//! Contains the dispatch logic for each CLI command. Every command
//! returns its formatted output as a string; the binary decides where
//! it goes.

#![allow(clippy::too_many_lines)]

use crate::chunking::ChunkStrategy;
use crate::cli::output::{
    OutputFormat, format_chunks, format_exec_result, format_hits, format_index_outcome,
    format_runtimes, format_sources, format_terms,
};
use crate::cli::parser::{Cli, Commands};
use crate::core::ExecRequest;
use crate::error::{Error, Result};
use crate::gateway::{Gateway, IndexRequest};
use crate::io::read_document;
use crate::runtime::Language;
use crate::store::IndexStore;
use std::io::Read;
use std::path::PathBuf;

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    let store = match &cli.db_path {
        Some(path) => IndexStore::open(path)?,
        None => IndexStore::open_default()?,
    };
    let mut gateway = Gateway::with_store(store);

    match &cli.command {
        Commands::Run {
            language,
            code,
            code_file,
            timeout_ms,
            workdir,
            file_target,
            index_as,
        } => cmd_run(
            &mut gateway,
            language,
            code.as_deref(),
            code_file.as_deref(),
            *timeout_ms,
            workdir.clone(),
            file_target.clone(),
            index_as.as_deref(),
            format,
        ),
        Commands::Index {
            content,
            path,
            label,
            mode,
        } => cmd_index(
            &mut gateway,
            content.clone(),
            path.clone(),
            label.clone(),
            mode,
            format,
        ),
        Commands::Search {
            query,
            limit,
            source,
        } => {
            let hits = gateway.search(query, *limit, source.as_deref())?;
            Ok(format_hits(&hits, format))
        }
        Commands::Sources => {
            let sources = gateway.list_sources()?;
            Ok(format_sources(&sources, format))
        }
        Commands::Chunks { source_id } => {
            let chunks = gateway.chunks_by_source(*source_id)?;
            Ok(format_chunks(&chunks, format))
        }
        Commands::Terms {
            source_id,
            max_terms,
        } => {
            let terms = gateway.distinctive_terms(*source_id, *max_terms)?;
            Ok(format_terms(&terms, format))
        }
        Commands::Runtimes => Ok(format_runtimes(gateway.runtimes().iter(), format)),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    gateway: &mut Gateway,
    language: &str,
    code: Option<&str>,
    code_file: Option<&std::path::Path>,
    timeout_ms: u64,
    workdir: Option<PathBuf>,
    file_target: Option<PathBuf>,
    index_as: Option<&str>,
    format: OutputFormat,
) -> Result<String> {
    let language = Language::from_tag(language)?;
    let code = resolve_code(code, code_file)?;

    let mut request = ExecRequest::new(language, code).with_timeout_ms(timeout_ms);
    if let Some(dir) = workdir {
        request = request.with_workdir(dir);
    }
    if let Some(target) = file_target {
        request = request.with_target_file(target);
    }

    let result = gateway.execute(&request)?;

    if let Some(label) = index_as
        && !result.stdout.is_empty()
    {
        let outcome = gateway.index(
            &IndexRequest::from_content(result.stdout.clone())
                .with_label(label)
                .with_strategy(ChunkStrategy::Plain),
        )?;
        tracing::info!(source_id = outcome.source_id, label, "execution output indexed");
    }

    Ok(format_exec_result(&result, format))
}

/// Picks the code source: positional argument, file, or stdin.
fn resolve_code(code: Option<&str>, code_file: Option<&std::path::Path>) -> Result<String> {
    if let Some(code) = code {
        return Ok(code.to_string());
    }
    if let Some(path) = code_file {
        return read_document(path);
    }

    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(Error::from)?;
    if buffer.trim().is_empty() {
        return Err(Error::bad_request(
            "no code given (argument, --code-file, or stdin)",
        ));
    }
    Ok(buffer)
}

fn cmd_index(
    gateway: &mut Gateway,
    content: Option<String>,
    path: Option<PathBuf>,
    label: Option<String>,
    mode: &str,
    format: OutputFormat,
) -> Result<String> {
    let request = IndexRequest {
        content,
        path,
        label,
        strategy: ChunkStrategy::parse(mode),
    };
    let outcome = gateway.index(&request)?;
    Ok(format_index_outcome(&outcome, format))
}
