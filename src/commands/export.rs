use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::TaskFields;
use crate::output::{self, Format};
use crate::store::TaskStore;
use crate::taskwarrior;

/// Write every task as `task import` NDJSON, to `output` or stdout.
pub fn run(store: &dyn TaskStore, output: Option<&Path>, format: Format) -> Result<()> {
    let fields: Vec<TaskFields> = store.list_all()?.into_iter().map(|t| t.fields).collect();
    let records = taskwarrior::denormalize(&fields);
    let ndjson = taskwarrior::to_ndjson(&records)?;
    log::info!("event=export records={}", records.len());

    let Some(path) = output else {
        print!("{ndjson}");
        return Ok(());
    };
    fs::write(path, ndjson)?;
    match format {
        Format::Json => output::print_json(&serde_json::json!({
            "exported_count": records.len(),
            "path": path.display().to_string(),
        }))?,
        Format::Pretty | Format::Minimal => {
            println!("Exported {} tasks to {}", records.len(), path.display())
        }
    }
    Ok(())
}
