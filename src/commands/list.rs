use crate::error::Result;
use crate::output::{self, Format};
use crate::store::TaskStore;
use crate::views::Filter;

pub fn run(store: &dyn TaskStore, filter: &Filter, format: Format) -> Result<()> {
    let tasks = filter.apply(store.list_all()?);
    output::print_tasks(&tasks, format)
}
