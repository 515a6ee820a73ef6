use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{CONFIG_FILE, Config};
use crate::error::{GtdError, Result};
use crate::model::{Task, TaskFields};
use crate::store::lock::LockGuard;
use crate::store::{GTD_DIR, TaskStore, new_task};

#[derive(Deserialize, Serialize)]
struct Counter {
    next_id: u64,
}

/// Tasks as `.gtd/tasks/<id>.json`, ids from `.gtd/counter.json`.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open an existing .gtd directory.
    pub fn open(repo_root: &Path) -> Result<Self> {
        let root = repo_root.join(GTD_DIR);
        if !root.join(CONFIG_FILE).exists() {
            return Err(GtdError::NotInitialized);
        }
        Ok(Self { root })
    }

    /// Initialize a new .gtd directory.
    pub fn init(repo_root: &Path) -> Result<Self> {
        let root = repo_root.join(GTD_DIR);
        if root.join(CONFIG_FILE).exists() {
            return Err(GtdError::AlreadyInitialized);
        }

        fs::create_dir_all(root.join("tasks"))?;
        fs::write(
            root.join("counter.json"),
            serde_json::to_string(&Counter { next_id: 1 })?,
        )?;
        Config::default().save(&root)?;
        log::info!("event=store_init root={}", root.display());

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> Result<Config> {
        Config::load(&self.root)
    }

    fn tasks_dir(&self) -> PathBuf {
        self.root.join("tasks")
    }

    fn task_path(&self, id: u64) -> PathBuf {
        self.tasks_dir().join(format!("{id}.json"))
    }

    fn counter_path(&self) -> PathBuf {
        self.root.join("counter.json")
    }

    fn next_id(&self) -> Result<u64> {
        let _guard = LockGuard::acquire(&self.root.join("counter.lock"))?;

        let mut counter: Counter = serde_json::from_str(&fs::read_to_string(self.counter_path())?)?;
        let id = counter.next_id;
        counter.next_id += 1;
        fs::write(self.counter_path(), serde_json::to_string(&counter)?)?;
        Ok(id)
    }

    fn list_ids(&self) -> Result<Vec<u64>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.tasks_dir())? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".json")
                && let Ok(id) = stem.parse::<u64>()
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

impl TaskStore for FileStore {
    fn create(&self, fields: TaskFields) -> Result<Task> {
        // Validate before burning an id.
        let mut task = new_task(0, fields, Utc::now())?;
        task.id = self.next_id()?;
        fs::write(self.task_path(task.id), serde_json::to_string_pretty(&task)?)?;
        log::debug!("event=task_created id={}", task.id);
        Ok(task)
    }

    fn read(&self, id: u64) -> Result<Task> {
        let path = self.task_path(id);
        if !path.exists() {
            return Err(GtdError::TaskNotFound(id));
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    fn write(&self, task: &Task) -> Result<()> {
        let path = self.task_path(task.id);
        if !path.exists() {
            return Err(GtdError::TaskNotFound(task.id));
        }
        fs::write(path, serde_json::to_string_pretty(task)?)?;
        Ok(())
    }

    fn delete(&self, id: u64) -> Result<()> {
        let path = self.task_path(id);
        if !path.exists() {
            return Err(GtdError::TaskNotFound(id));
        }
        fs::remove_file(path)?;
        log::debug!("event=task_deleted id={id}");
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<Task>> {
        self.list_ids()?
            .into_iter()
            .map(|id| self.read(id))
            .collect()
    }
}
