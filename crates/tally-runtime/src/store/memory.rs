//! In-process realtime datastore.
//!
//! The whole tree lives inside a `tokio::sync::watch` channel. Each write is
//! one `send_if_modified` call, so it is applied under a single lock
//! acquisition and every watcher is woken exactly when the tree changed.
//!
//! The tree can be saved to and restored from a JSON file:
//!
//! ```text
//! ~/.tally/data.json        live snapshot
//! ~/.tally/.data.json.tmp   written first, then renamed over the snapshot
//! ```

use super::datastore::TreeState;
use super::{tree, Datastore, StoreError, Watch};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tally_types::DataPath;
use tokio::fs;
use tokio::sync::watch;

/// In-memory [`Datastore`] with live watches.
///
/// Cheap to clone; clones share the same tree.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tally_runtime::store::{Datastore, MemoryDatastore};
/// use tally_types::DataPath;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryDatastore::new();
/// let path = DataPath::parse("employees")?;
/// let mut watch = store.watch(&path).await?;
///
/// assert_eq!(watch.next().await.unwrap()?, json!(null));
///
/// store.set(&DataPath::parse("employees/e1")?, json!({"name": "Ali"})).await?;
/// assert_eq!(watch.next().await.unwrap()?, json!({"e1": {"name": "Ali"}}));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryDatastore {
    tx: Arc<watch::Sender<TreeState>>,
}

impl MemoryDatastore {
    /// Creates an empty datastore.
    #[must_use]
    pub fn new() -> Self {
        Self::from_value(Value::Null)
    }

    /// Creates a datastore holding `root`.
    #[must_use]
    pub fn from_value(root: Value) -> Self {
        let (tx, _) = watch::channel(TreeState {
            root: Arc::new(root),
            closed: false,
        });
        Self { tx: Arc::new(tx) }
    }

    /// Restores a datastore from a JSON snapshot file.
    ///
    /// A missing file yields an empty datastore.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persist`] if the file cannot be read and
    /// [`StoreError::Serialization`] if it is not valid JSON.
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let json = match fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no snapshot, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(StoreError::persist(path, e)),
        };
        let root: Value = serde_json::from_str(&json)?;
        tree::validate_keys(&root)?;
        tracing::debug!(path = %path.display(), "restored snapshot");
        Ok(Self::from_value(root))
    }

    /// Writes the tree to `path` as pretty-printed JSON.
    ///
    /// Writes to a temp file next to `path` first, then renames it over the
    /// target. Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persist`] on I/O failure.
    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        let root = self.snapshot();
        let json = serde_json::to_string_pretty(&*root)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::persist(parent, e))?;
        }

        let temp_path = temp_path(path);
        fs::write(&temp_path, &json)
            .await
            .map_err(|e| StoreError::persist(&temp_path, e))?;
        fs::rename(&temp_path, path)
            .await
            .map_err(|e| StoreError::persist(path, e))?;

        tracing::debug!(path = %path.display(), bytes = json.len(), "saved snapshot");
        Ok(())
    }

    /// Returns the whole tree as it is now.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Value> {
        Arc::clone(&self.tx.borrow().root)
    }

    /// Returns the number of live watches.
    #[must_use]
    pub fn active_watches(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Closes the datastore.
    ///
    /// Live watches yield [`StoreError::Closed`] and end; later writes fail.
    pub fn close(&self) {
        self.tx.send_if_modified(|state| {
            let was_open = !state.closed;
            state.closed = true;
            was_open
        });
    }

    /// Returns `true` after [`close`](Self::close).
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.borrow().closed
    }

    /// Applies `op` to the tree under the channel's write lock.
    ///
    /// `op` returns whether it changed the tree; watchers are only notified
    /// when it did.
    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut Value) -> Result<(T, bool), StoreError>,
    ) -> Result<T, StoreError> {
        let mut outcome = Err(StoreError::Closed);
        self.tx.send_if_modified(|state| {
            if state.closed {
                return false;
            }
            match op(Arc::make_mut(&mut state.root)) {
                Ok((value, changed)) => {
                    outcome = Ok(value);
                    changed
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });
        outcome
    }

    fn read(&self, path: &DataPath) -> Result<Option<Value>, StoreError> {
        let state = self.tx.borrow();
        if state.closed {
            return Err(StoreError::Closed);
        }
        Ok(tree::get_at(&state.root, path).cloned())
    }
}

impl Default for MemoryDatastore {
    fn default() -> Self {
        Self::new()
    }
}

impl Datastore for MemoryDatastore {
    async fn watch(&self, path: &DataPath) -> Result<Watch, StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        tracing::trace!(path = %path, "watch opened");
        Ok(Watch::new(path.clone(), self.tx.subscribe()))
    }

    async fn get(&self, path: &DataPath) -> Result<Option<Value>, StoreError> {
        self.read(path)
    }

    async fn set(&self, path: &DataPath, value: Value) -> Result<(), StoreError> {
        tree::validate_keys(&value)?;
        let changed = self.mutate(|root| {
            let changed = tree::set_at(root, path, value);
            Ok((changed, changed))
        })?;
        tracing::debug!(path = %path, changed, "set");
        Ok(())
    }

    async fn update(&self, path: &DataPath, fields: Map<String, Value>) -> Result<(), StoreError> {
        for (key, value) in &fields {
            tally_types::validate_key(key)?;
            tree::validate_keys(value)?;
        }
        let changed = self.mutate(|root| {
            let changed = tree::merge_at(root, path, fields)?;
            Ok((changed, changed))
        })?;
        tracing::debug!(path = %path, changed, "update");
        Ok(())
    }

    async fn remove(&self, path: &DataPath) -> Result<(), StoreError> {
        let changed = self.mutate(|root| {
            let changed = tree::remove_at(root, path);
            Ok((changed, changed))
        })?;
        tracing::debug!(path = %path, changed, "remove");
        Ok(())
    }

    async fn compare_and_set(
        &self,
        path: &DataPath,
        expected: Option<&Value>,
        new: Value,
    ) -> Result<bool, StoreError> {
        tree::validate_keys(&new)?;
        self.mutate(|root| {
            if tree::get_at(root, path) != expected {
                return Ok((false, false));
            }
            let changed = tree::set_at(root, path, new);
            Ok((true, changed))
        })
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data.json".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn path(s: &str) -> DataPath {
        DataPath::parse(s).expect("valid path")
    }

    #[tokio::test]
    async fn set_get_remove() {
        let store = MemoryDatastore::new();
        let p = path("employees/e1");

        store.set(&p, json!({"name": "Ali"})).await.unwrap();
        assert_eq!(store.get(&p).await.unwrap(), Some(json!({"name": "Ali"})));

        store.remove(&p).await.unwrap();
        assert_eq!(store.get(&p).await.unwrap(), None);

        // Removing again is fine.
        store.remove(&p).await.unwrap();
    }

    #[tokio::test]
    async fn update_missing_fails() {
        let store = MemoryDatastore::new();
        let result = store.update(&path("employees/e1"), Map::new()).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert_eq!(store.get(&path("employees")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn update_rejects_invalid_field_names() {
        let store = MemoryDatastore::from_value(json!({"employees": {"e1": {"name": "Ali"}}}));
        let mut fields = Map::new();
        fields.insert("a.b".into(), json!(1));

        let result = store.update(&path("employees/e1"), fields).await;
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn compare_and_set_checks_expectation() {
        let store = MemoryDatastore::new();
        let p = path("counters/invoice");

        assert!(store.compare_and_set(&p, None, json!(1000)).await.unwrap());
        assert!(!store
            .compare_and_set(&p, Some(&json!(999)), json!(1000))
            .await
            .unwrap());
        assert!(store
            .compare_and_set(&p, Some(&json!(1000)), json!(1001))
            .await
            .unwrap());
        assert_eq!(store.get(&p).await.unwrap(), Some(json!(1001)));
    }

    #[tokio::test]
    async fn watch_skips_unrelated_changes() {
        let store = MemoryDatastore::new();
        let mut watch = store.watch(&path("employees")).await.unwrap();
        assert_eq!(watch.next().await.unwrap().unwrap(), Value::Null);

        store.set(&path("counters/x"), json!(1)).await.unwrap();
        store.set(&path("employees/e1"), json!({"n": 1})).await.unwrap();

        assert_eq!(
            watch.next().await.unwrap().unwrap(),
            json!({"e1": {"n": 1}})
        );
    }

    #[tokio::test]
    async fn dropping_watch_releases_it() {
        let store = MemoryDatastore::new();
        let watch = store.watch(&path("employees")).await.unwrap();
        let other = store.watch(&path("roles")).await.unwrap();
        assert_eq!(store.active_watches(), 2);

        drop(watch);
        assert_eq!(store.active_watches(), 1);
        drop(other);
        assert_eq!(store.active_watches(), 0);
    }

    #[tokio::test]
    async fn close_ends_watches_and_writes() {
        let store = MemoryDatastore::new();
        let mut watch = store.watch(&path("employees")).await.unwrap();
        watch.next().await.unwrap().unwrap();

        store.close();

        assert!(matches!(watch.next().await, Some(Err(StoreError::Closed))));
        assert!(watch.next().await.is_none());
        assert!(matches!(
            store.set(&path("employees/e1"), json!({})).await,
            Err(StoreError::Closed)
        ));
    }

    #[tokio::test]
    async fn dropping_datastore_ends_watches() {
        let store = MemoryDatastore::new();
        let mut watch = store.watch(&path("employees")).await.unwrap();
        watch.next().await.unwrap().unwrap();

        drop(store);

        assert!(matches!(watch.next().await, Some(Err(StoreError::Closed))));
        assert!(watch.next().await.is_none());
    }

    #[tokio::test]
    async fn save_and_load() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("nested").join("data.json");

        let store = MemoryDatastore::new();
        store
            .set(&path("employees/e1"), json!({"name": "Ali"}))
            .await
            .unwrap();
        store.save(&file).await.unwrap();
        assert!(!temp_path(&file).exists());

        let loaded = MemoryDatastore::load(&file).await.unwrap();
        assert_eq!(*loaded.snapshot(), *store.snapshot());
    }

    #[tokio::test]
    async fn load_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        let store = MemoryDatastore::load(&temp.path().join("absent.json"))
            .await
            .unwrap();
        assert_eq!(*store.snapshot(), Value::Null);
    }

    #[tokio::test]
    async fn load_rejects_invalid_json() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("data.json");
        std::fs::write(&file, "{not json").unwrap();

        let result = MemoryDatastore::load(&file).await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
