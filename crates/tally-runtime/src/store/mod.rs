//! Datastore boundary and the collection store built on it.
//!
//! # Architecture
//!
//! ```text
//! CollectionStore ──┐
//! CounterAllocator ─┼──► Datastore (trait) ──► MemoryDatastore
//! RoleCatalogWatcher┘        │                   │  tokio::sync::watch<TreeState>
//!                            ▼                   ▼
//!                          Watch ◄──────── one receiver per watch
//! ```
//!
//! | Type | Role |
//! |------|------|
//! | [`Datastore`] | Tree get/set/update/remove, compare-and-set, live watch |
//! | [`MemoryDatastore`] | In-process implementation, JSON snapshot persistence |
//! | [`CollectionStore`] | Subscribe/create/update/remove/get/list per collection |
//! | [`CollectionSubscription`] | Live snapshots of one collection |
//! | [`SnapshotLock`] | Cross-process exclusive access to a snapshot file |

mod collection;
mod datastore;
mod error;
mod lock;
mod memory;
mod record;
mod subscription;
mod tree;

pub use collection::CollectionStore;
pub use datastore::{Datastore, Watch};
pub use error::{StoreError, SubscriptionError};
pub use lock::SnapshotLock;
pub use memory::MemoryDatastore;
pub use record::{Record, ID_FIELD};
pub use subscription::CollectionSubscription;
