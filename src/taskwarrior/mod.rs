//! TaskWarrior / TaskChampion bridge.
//!
//! [`normalize`] turns an upload of unknown shape into [`TaskFields`]
//! records; [`denormalize`] goes the other way for `task import`.

mod export;
mod reconcile;
mod shape;
mod sqlite;
pub mod timestamp;

use serde::{Deserialize, Serialize};

use crate::error::{GtdError, Result};
use crate::model::TaskFields;

pub use export::{EXPORT_FILE_NAME, ExternalRecord, denormalize, denormalize_at, to_ndjson};
pub use reconcile::{Reconciled, SkipReason, UNTITLED, reconcile};
pub use shape::Shape;
pub use sqlite::{TableStrategy, looks_like_sqlite};

/// Upper bounds on the loops an upload can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportLimits {
    pub max_rows: usize,
    pub max_salvage_fragments: usize,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_rows: 100_000,
            max_salvage_fragments: 10_000,
        }
    }
}

/// Result of normalizing one upload.
#[derive(Debug)]
pub struct ImportBatch {
    pub shape: Shape,
    pub records: Vec<TaskFields>,
    /// Records dropped for lack of a usable description.
    pub skipped: usize,
    /// Records kept with only title, completion and notes.
    pub fallbacks: usize,
}

pub fn normalize(blob: &[u8], source_hint: Option<&str>) -> Result<ImportBatch> {
    normalize_with(blob, source_hint, &ImportLimits::default())
}

pub fn normalize_with(
    blob: &[u8],
    source_hint: Option<&str>,
    limits: &ImportLimits,
) -> Result<ImportBatch> {
    let (shape, raw) = if looks_like_sqlite(blob, source_hint) {
        let rows = sqlite::read_task_rows(blob, limits).map_err(|err| {
            log::info!("event=import_sqlite_failed reason=\"{err}\"");
            GtdError::ImportFormat(format!(
                "no tasks found in the SQLite database or not a valid TaskChampion file ({err})"
            ))
        })?;
        (Shape::Sqlite, rows)
    } else {
        let text = String::from_utf8_lossy(blob);
        shape::detect_json(&text, limits).ok_or_else(|| {
            GtdError::ImportFormat("no valid tasks found in the input".into())
        })?
    };
    log::info!(
        "event=import_shape shape={} raw_records={}",
        shape.name(),
        raw.len()
    );

    let mut batch = ImportBatch {
        shape,
        records: Vec::with_capacity(raw.len()),
        skipped: 0,
        fallbacks: 0,
    };
    for (position, record) in raw.iter().enumerate() {
        match reconcile(record) {
            Reconciled::Full(fields) => batch.records.push(fields),
            Reconciled::Minimal(fields) => {
                batch.fallbacks += 1;
                batch.records.push(fields);
            }
            Reconciled::Skipped(reason) => {
                log::debug!("event=import_skip position={position} reason={reason:?}");
                batch.skipped += 1;
            }
        }
    }
    log::info!(
        "event=import_normalized records={} skipped={} fallbacks={}",
        batch.records.len(),
        batch.skipped,
        batch.fallbacks
    );
    Ok(batch)
}
