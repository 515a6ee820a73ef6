use chrono::Utc;

use crate::error::Result;
use crate::output::{self, Format};
use crate::store::TaskStore;

fn set_completed(store: &dyn TaskStore, id: u64, completed: bool, format: Format) -> Result<()> {
    let mut task = store.read(id)?;
    if task.completed != completed {
        task.fields.completed = completed;
        task.updated_at = Utc::now();
        store.write(&task)?;
    }
    output::print_task(&task, format)
}

pub fn complete(store: &dyn TaskStore, id: u64, format: Format) -> Result<()> {
    set_completed(store, id, true, format)
}

pub fn restore(store: &dyn TaskStore, id: u64, format: Format) -> Result<()> {
    set_completed(store, id, false, format)
}
