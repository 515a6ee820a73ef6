use crate::error::Result;
use crate::output::{self, Format};
use crate::store::TaskStore;
use crate::syntax;

pub fn run(store: &dyn TaskStore, line: &str, notes: Option<String>, format: Format) -> Result<()> {
    let mut fields = syntax::parse_task(line)?;
    if let Some(notes) = notes {
        fields.notes = notes;
    }
    let task = store.create(fields)?;
    log::info!("event=task_added id={}", task.id);
    output::print_task(&task, format)
}
