use std::path::Path;

use crate::error::Result;
use crate::store::files::FileStore;

pub fn run(repo_root: &Path) -> Result<()> {
    let store = FileStore::init(repo_root)?;
    eprintln!("Initialized {} in {}", crate::store::GTD_DIR, repo_root.display());
    log::debug!("event=init root={}", store.root().display());
    Ok(())
}
