pub mod files;
pub mod lock;
pub mod memory;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{GtdError, Result};
use crate::model::{Task, TaskFields};

/// Directory holding a gtd repository's state.
pub const GTD_DIR: &str = ".gtd";

/// Where tasks live. Commands only talk to this trait.
pub trait TaskStore {
    /// Normalize `fields`, allocate an id and persist a new task.
    fn create(&self, fields: TaskFields) -> Result<Task>;
    fn read(&self, id: u64) -> Result<Task>;
    /// Replace an existing task.
    fn write(&self, task: &Task) -> Result<()>;
    fn delete(&self, id: u64) -> Result<()>;
    /// Every task, ordered by id.
    fn list_all(&self) -> Result<Vec<Task>>;
}

/// Build the stored form of a new task. Fails on an empty title.
pub(crate) fn new_task(id: u64, mut fields: TaskFields, now: DateTime<Utc>) -> Result<Task> {
    fields.normalize();
    if fields.title.is_empty() {
        return Err(GtdError::EmptyTitle);
    }
    Ok(Task {
        id,
        fields,
        created_at: now,
        updated_at: now,
    })
}

/// Walk up from the current directory to the nearest one containing `.gtd/`.
pub fn find_repo_root() -> Result<PathBuf> {
    find_repo_root_from(&std::env::current_dir()?)
}

pub fn find_repo_root_from(start: &Path) -> Result<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(GTD_DIR).is_dir() {
            return Ok(dir);
        }
        if !dir.pop() {
            return Err(GtdError::NotInitialized);
        }
    }
}
