use chrono::Local;

use crate::error::Result;
use crate::output::{self, Format};
use crate::store::TaskStore;
use crate::views;

pub fn run(store: &dyn TaskStore, include_completed: bool, format: Format) -> Result<()> {
    let today = Local::now().date_naive();
    let days = views::calendar(&store.list_all()?, today, include_completed);
    output::print_calendar(&days, format)
}
