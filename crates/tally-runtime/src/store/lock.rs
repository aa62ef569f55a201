//! Exclusive lock on a snapshot file shared between processes.

use super::StoreError;
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Advisory lock held beside a snapshot file until dropped.
///
/// Every process that loads, mutates and saves the same snapshot must hold
/// this lock for the whole sequence, otherwise two processes can read the
/// same counter value or overwrite each other's records.
///
/// The lock lives in a sibling file `.<name>.lock`; the snapshot itself is
/// replaced by rename on save and cannot carry the lock.
#[derive(Debug)]
pub struct SnapshotLock {
    path: PathBuf,
    _file: File,
}

impl SnapshotLock {
    /// Returns the lock file path for a snapshot path.
    ///
    /// # Example
    ///
    /// ```
    /// use std::path::Path;
    /// use tally_runtime::store::SnapshotLock;
    ///
    /// assert_eq!(
    ///     SnapshotLock::path_for(Path::new("/srv/tally/data.json")),
    ///     Path::new("/srv/tally/.data.json.lock")
    /// );
    /// ```
    #[must_use]
    pub fn path_for(data_path: &Path) -> PathBuf {
        let name = data_path
            .file_name()
            .map_or_else(|| "data".into(), |n| n.to_string_lossy());
        data_path.with_file_name(format!(".{name}.lock"))
    }

    /// Blocks until the lock for `data_path` is held.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Lock`] if the lock file cannot be created or
    /// locked.
    pub async fn acquire(data_path: &Path) -> Result<Self, StoreError> {
        let path = Self::path_for(data_path);
        let task_path = path.clone();
        tokio::task::spawn_blocking(move || Self::acquire_blocking(task_path))
            .await
            .map_err(|e| StoreError::lock(&path, std::io::Error::other(e)))?
    }

    fn acquire_blocking(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::lock(&path, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StoreError::lock(&path, e))?;

        tracing::debug!(path = %path.display(), "waiting for snapshot lock");
        FileExt::lock_exclusive(&file).map_err(|e| StoreError::lock(&path, e))?;
        tracing::debug!(path = %path.display(), "snapshot lock held");

        Ok(Self { path, _file: file })
    }

    /// Returns the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SnapshotLock {
    fn drop(&mut self) {
        // Closing the file releases the lock.
        tracing::debug!(path = %self.path.display(), "snapshot lock released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn lock_file_sits_beside_snapshot() {
        assert_eq!(
            SnapshotLock::path_for(Path::new("data.json")),
            PathBuf::from(".data.json.lock")
        );
        assert_eq!(
            SnapshotLock::path_for(Path::new("/var/lib/tally/shop.json")),
            PathBuf::from("/var/lib/tally/.shop.json.lock")
        );
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("nested/dir/data.json");

        let lock = SnapshotLock::acquire(&data).await.unwrap();
        assert!(lock.path().exists());
    }

    #[tokio::test]
    async fn second_holder_waits_for_release() {
        let temp = TempDir::new().unwrap();
        let data = temp.path().join("data.json");
        let first = SnapshotLock::acquire(&data).await.unwrap();

        let waiter = tokio::spawn({
            let data = data.clone();
            async move { SnapshotLock::acquire(&data).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!waiter.is_finished());

        drop(first);
        let second = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("lock handed over")
            .unwrap()
            .unwrap();
        assert_eq!(second.path(), SnapshotLock::path_for(&data));
    }
}
