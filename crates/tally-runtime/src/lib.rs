//! Tally runtime.
//!
//! Realtime collections, counters and the live role catalog on top of a
//! hierarchical JSON datastore.
//!
//! # Crate Architecture
//!
//! ```text
//! tally-types   (keys, DataPath, ErrorCode)
//!     ↑
//! tally-auth    (ModuleCatalog, RoleCatalog, PermissionEvaluator)
//!     ↑
//! tally-runtime  ◄── THIS CRATE
//! ├── store     Datastore trait, MemoryDatastore, CollectionStore, subscriptions
//! ├── counter   CounterAllocator (CAS loop), DocumentNumber
//! ├── roles     RoleCatalogWatcher (seed + live refresh)
//! ├── identity  IdentityProvider boundary
//! ├── textgen   TextGenerator boundary, OutputShape validation
//! ├── config    TallyConfig, ConfigLoader
//! └── app       Backoffice (everything wired together)
//!     ↑
//! tally-cli     (`tally` binary)
//! ```
//!
//! # Error Handling
//!
//! Every error enum implements [`tally_types::ErrorCode`]:
//!
//! | Error | Prefix |
//! |-------|--------|
//! | [`store::StoreError`] | `STORE_` |
//! | [`store::SubscriptionError`] | `SUBSCRIPTION_` |
//! | [`counter::AllocationError`] | `COUNTER_` |
//! | [`identity::IdentityError`] | `IDENTITY_` |
//! | [`textgen::GenerationError`] | `GENERATION_` |
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tally_runtime::store::{CollectionStore, MemoryDatastore};
//! use tally_types::{CollectionName, CounterName};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CollectionStore::new(MemoryDatastore::new());
//! let employees = CollectionName::parse("employees")?;
//!
//! let id = store.create(&employees, json!({"name": "Ali"})).await?;
//! store.update(&employees, id.as_str(), json!({"name": "Ali B.", "id": "hack"})).await?;
//!
//! let record = store.get(&employees, id.as_str()).await?.unwrap();
//! assert_eq!(record.id, id);
//! assert_eq!(record.get("name"), Some(&json!("Ali B.")));
//!
//! let invoice = CounterName::parse("invoice")?;
//! assert_eq!(store.next_counter_value(&invoice, 1000).await?, 1000);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod counter;
pub mod identity;
pub mod roles;
pub mod store;
pub mod textgen;

pub use app::{AppError, Backoffice};
pub use counter::{AllocationError, CounterAllocator, DocumentNumber, DEFAULT_START_FROM};
pub use store::{
    CollectionStore, CollectionSubscription, Datastore, MemoryDatastore, Record, StoreError,
    SubscriptionError,
};
