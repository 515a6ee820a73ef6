use crate::error::Result;
use crate::output::{self, Format};
use crate::store::TaskStore;
use crate::syntax;

/// Print a task, or with `as_syntax` the one-line form `add` would accept.
pub fn run(store: &dyn TaskStore, id: u64, as_syntax: bool, format: Format) -> Result<()> {
    let task = store.read(id)?;
    if as_syntax {
        let line = syntax::format(&task);
        match format {
            Format::Json => output::print_json(&serde_json::json!({ "id": id, "syntax": line }))?,
            Format::Pretty | Format::Minimal => println!("{line}"),
        }
        return Ok(());
    }
    output::print_task(&task, format)
}
