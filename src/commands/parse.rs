use crate::error::Result;
use crate::output::{self, Format};
use crate::syntax;

/// Show how a line would be read without touching any store.
pub fn run(line: &str, format: Format) -> Result<()> {
    let fields = syntax::parse(line);
    output::print_parsed(&fields, format)
}
