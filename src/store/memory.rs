use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::error::{GtdError, Result};
use crate::model::{Task, TaskFields};
use crate::store::{TaskStore, new_task};

#[derive(Default)]
struct Arena {
    last_id: u64,
    tasks: BTreeMap<u64, Task>,
}

/// In-process store. Each instance owns its own arena.
#[derive(Default)]
pub struct MemStore {
    arena: Mutex<Arena>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn arena(&self) -> MutexGuard<'_, Arena> {
        self.arena.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TaskStore for MemStore {
    fn create(&self, fields: TaskFields) -> Result<Task> {
        let mut arena = self.arena();
        let task = new_task(arena.last_id + 1, fields, Utc::now())?;
        arena.last_id = task.id;
        arena.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    fn read(&self, id: u64) -> Result<Task> {
        self.arena()
            .tasks
            .get(&id)
            .cloned()
            .ok_or(GtdError::TaskNotFound(id))
    }

    fn write(&self, task: &Task) -> Result<()> {
        match self.arena().tasks.get_mut(&task.id) {
            Some(slot) => {
                *slot = task.clone();
                Ok(())
            }
            None => Err(GtdError::TaskNotFound(task.id)),
        }
    }

    fn delete(&self, id: u64) -> Result<()> {
        self.arena()
            .tasks
            .remove(&id)
            .map(|_| ())
            .ok_or(GtdError::TaskNotFound(id))
    }

    fn list_all(&self) -> Result<Vec<Task>> {
        Ok(self.arena().tasks.values().cloned().collect())
    }
}
