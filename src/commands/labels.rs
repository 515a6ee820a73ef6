use crate::error::Result;
use crate::output::{self, Format, LabelKind};
use crate::store::TaskStore;
use crate::views;

pub fn run(store: &dyn TaskStore, kind: LabelKind, format: Format) -> Result<()> {
    let labels = views::labels(&store.list_all()?);
    output::print_labels(&labels, kind, format)
}
