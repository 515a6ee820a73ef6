use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::error::{GtdError, Result};

/// Exclusive advisory lock, released on drop.
pub struct LockGuard {
    file: File,
}

impl LockGuard {
    /// Try once to take the lock on `path`, creating the file if needed.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        file.try_lock_exclusive()
            .map_err(|_| GtdError::Locked(path.display().to_string()))?;
        log::trace!("event=lock_acquired path={}", path.display());

        Ok(Self { file })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            log::warn!("event=lock_release_failed reason=\"{err}\"");
        }
    }
}
