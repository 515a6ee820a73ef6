use crate::error::Result;
use crate::output::{self, Format};
use crate::store::TaskStore;

pub fn run(store: &dyn TaskStore, id: u64, format: Format) -> Result<()> {
    let task = store.read(id)?;
    store.delete(id)?;
    output::print_task(&task, format)
}
