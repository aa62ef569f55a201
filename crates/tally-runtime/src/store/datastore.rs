//! The datastore boundary.
//!
//! The [`Datastore`] trait is the only surface the collection store, the
//! counter allocator and the role catalog talk to. It models a hierarchical
//! JSON tree with live subtree watches and one atomic read-modify-write
//! primitive ([`Datastore::compare_and_set`]).

use super::StoreError;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use tally_types::{DataPath, RecordId};
use tokio::sync::watch;

/// Hierarchical realtime datastore.
///
/// Implementations must be thread-safe (`Send + Sync`) for use across async
/// tasks. Every mutation is applied atomically: watchers observe either the
/// state before or the state after, never a partial write.
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
/// let path = DataPath::parse("counters/invoice")?;
///
/// assert!(store.compare_and_set(&path, None, json!(1000)).await?);
/// // A stale expectation loses the race.
/// assert!(!store.compare_and_set(&path, None, json!(1000)).await?);
/// assert_eq!(store.get(&path).await?, Some(json!(1000)));
/// # Ok(())
/// # }
/// ```
pub trait Datastore: Send + Sync {
    /// Opens a live watch on the subtree at `path`.
    ///
    /// The first [`Watch::next`] yields the current value; later calls
    /// yield once per change of the subtree.
    fn watch(&self, path: &DataPath) -> impl Future<Output = Result<Watch, StoreError>> + Send;

    /// Reads the value at `path`.
    fn get(&self, path: &DataPath)
        -> impl Future<Output = Result<Option<Value>, StoreError>> + Send;

    /// Replaces the value at `path`. Writing `null` removes it.
    fn set(&self, path: &DataPath, value: Value)
        -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Merges `fields` into the existing object at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if nothing exists at `path`.
    fn update(
        &self,
        path: &DataPath,
        fields: Map<String, Value>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes the value at `path`. Removing a missing value succeeds.
    fn remove(&self, path: &DataPath) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Writes `new` at `path` only if the current value equals `expected`
    /// (`None` meaning absent).
    ///
    /// Returns `false` without writing when the expectation is stale.
    fn compare_and_set(
        &self,
        path: &DataPath,
        expected: Option<&Value>,
        new: Value,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Generates a fresh, time-ordered key for a new child node.
    fn generate_key(&self) -> RecordId {
        RecordId::generate()
    }
}

/// Shared tree state published to watchers.
#[derive(Debug, Clone, Default)]
pub(crate) struct TreeState {
    pub(crate) root: Arc<Value>,
    pub(crate) closed: bool,
}

/// A live watch on one subtree.
///
/// Dropping the watch releases it.
#[derive(Debug)]
pub struct Watch {
    path: DataPath,
    rx: watch::Receiver<TreeState>,
    last: Option<Value>,
    primed: bool,
    finished: bool,
}

impl Watch {
    pub(crate) fn new(path: DataPath, rx: watch::Receiver<TreeState>) -> Self {
        Self {
            path,
            rx,
            last: None,
            primed: false,
            finished: false,
        }
    }

    /// Returns the watched path.
    #[must_use]
    pub fn path(&self) -> &DataPath {
        &self.path
    }

    /// Waits for the next value of the subtree.
    ///
    /// Absent subtrees are reported as `Value::Null`. Returns
    /// `Some(Err(StoreError::Closed))` once when the datastore closes, then
    /// `None` forever.
    pub async fn next(&mut self) -> Option<Result<Value, StoreError>> {
        if self.finished {
            return None;
        }
        loop {
            if self.primed && self.rx.changed().await.is_err() {
                return self.finish();
            }
            self.primed = true;

            let (root, closed) = {
                let state = self.rx.borrow_and_update();
                (Arc::clone(&state.root), state.closed)
            };
            if closed {
                return self.finish();
            }

            let current = super::tree::get_at(&root, &self.path)
                .cloned()
                .unwrap_or(Value::Null);
            if self.last.as_ref() != Some(&current) {
                self.last = Some(current.clone());
                return Some(Ok(current));
            }
        }
    }

    fn finish(&mut self) -> Option<Result<Value, StoreError>> {
        self.finished = true;
        Some(Err(StoreError::Closed))
    }
}
