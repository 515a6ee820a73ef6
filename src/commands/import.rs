use std::fs;
use std::io::Read;
use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use crate::error::{GtdError, Result};
use crate::model::{Task, TaskFields};
use crate::output::{self, Format};
use crate::store::TaskStore;
use crate::store::memory::MemStore;
use crate::taskwarrior::{self, ImportLimits, Shape};

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub imported_count: usize,
    pub skipped_count: usize,
    pub fallback_count: usize,
    pub message: String,
    pub shape: Shape,
    pub dry_run: bool,
    pub source: String,
}

/// Normalize `source` (a path or `-` for stdin) and persist the records.
/// With `dry_run` the records go into a throwaway in-memory store.
pub fn run(
    store: &dyn TaskStore,
    source: &str,
    dry_run: bool,
    limits: &ImportLimits,
    format: Format,
) -> Result<()> {
    let blob = read_source(source)?;
    let hint = (source != "-").then(|| {
        Path::new(source)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.to_string())
    });

    let report = import_blob(store, &blob, hint.as_deref(), source, dry_run, limits)?;
    print_report(&report, format)
}

pub fn import_blob(
    store: &dyn TaskStore,
    blob: &[u8],
    hint: Option<&str>,
    source: &str,
    dry_run: bool,
    limits: &ImportLimits,
) -> Result<ImportReport> {
    let batch = taskwarrior::normalize_with(blob, hint, limits)?;

    let scratch;
    let target: &dyn TaskStore = if dry_run {
        scratch = MemStore::new();
        &scratch
    } else {
        store
    };
    let created = apply(target, batch.records)?;

    let verb = if dry_run { "Would import" } else { "Imported" };
    let mut message = format!("{verb} {} tasks", created.len());
    if batch.skipped > 0 {
        message.push_str(&format!(", skipped {} without a description", batch.skipped));
    }
    if batch.fallbacks > 0 {
        message.push_str(&format!(
            ", {} kept with title and notes only",
            batch.fallbacks
        ));
    }

    Ok(ImportReport {
        imported_count: created.len(),
        skipped_count: batch.skipped,
        fallback_count: batch.fallbacks,
        message,
        shape: batch.shape,
        dry_run,
        source: source.to_string(),
    })
}

fn read_source(source: &str) -> Result<Vec<u8>> {
    if source == "-" {
        let mut contents = Vec::new();
        std::io::stdin().read_to_end(&mut contents)?;
        return Ok(contents);
    }
    Ok(fs::read(source)?)
}

fn apply(store: &dyn TaskStore, records: Vec<TaskFields>) -> Result<Vec<Task>> {
    let mut created: Vec<Task> = Vec::with_capacity(records.len());
    for fields in records {
        match store.create(fields) {
            Ok(task) => created.push(task),
            Err(err) => return abort_with_rollback(store, &created, err),
        }
    }
    Ok(created)
}

fn abort_with_rollback<T>(store: &dyn TaskStore, created: &[Task], err: GtdError) -> Result<T> {
    let mut cleanup_failures = Vec::new();
    for task in created.iter().rev() {
        if let Err(cleanup) = store.delete(task.id)
            && !matches!(cleanup, GtdError::TaskNotFound(_))
        {
            cleanup_failures.push(format!("task {}: {cleanup}", task.id));
        }
    }
    log::warn!(
        "event=import_rollback created={} cleanup_failures={}",
        created.len(),
        cleanup_failures.len()
    );
    if cleanup_failures.is_empty() {
        Err(err)
    } else {
        Err(GtdError::ImportFormat(format!(
            "import failed ({err}); rollback failed ({})",
            cleanup_failures.join("; ")
        )))
    }
}

fn print_report(report: &ImportReport, format: Format) -> Result<()> {
    match format {
        Format::Json => output::print_json(report)?,
        Format::Pretty => {
            println!("{}", report.message.bold());
            println!(
                "  {} {}  {} {}  {} {}  {} {}",
                "shape:".dimmed(),
                report.shape.name(),
                "imported:".dimmed(),
                report.imported_count.to_string().green(),
                "skipped:".dimmed(),
                report.skipped_count,
                "simplified:".dimmed(),
                report.fallback_count,
            );
        }
        Format::Minimal => println!(
            "{} {} {} {}",
            report.imported_count, report.skipped_count, report.fallback_count, report.source
        ),
    }
    Ok(())
}
