//! Live role catalog.
//!
//! [`RoleCatalogWatcher`] keeps a [`CatalogHandle`] in sync with the
//! `roles` subtree of the datastore. The handle stays `Unloaded` until the
//! first successful read, after which every change to stored roles is
//! published wholesale.

use crate::store::{Datastore, StoreError};
use tally_auth::{CatalogHandle, RoleCatalog};
use tally_types::DataPath;
use tokio::task::JoinHandle;

/// Feeds stored roles into a [`CatalogHandle`].
///
/// # Example
///
/// ```
/// use tally_auth::{CatalogHandle, ModuleCatalog, RoleCatalog};
/// use tally_runtime::roles::RoleCatalogWatcher;
/// use tally_runtime::store::MemoryDatastore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let handle = CatalogHandle::new();
/// let watcher = RoleCatalogWatcher::new(MemoryDatastore::new(), handle.clone())
///     .with_seed(RoleCatalog::default_seed(&ModuleCatalog::retail()));
///
/// let catalog = watcher.load().await?;
/// assert!(handle.is_ready());
/// assert!(!catalog.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RoleCatalogWatcher<D> {
    datastore: D,
    handle: CatalogHandle,
    seed: Option<RoleCatalog>,
}

impl<D: Datastore> RoleCatalogWatcher<D> {
    /// Creates a watcher that never seeds.
    pub fn new(datastore: D, handle: CatalogHandle) -> Self {
        Self {
            datastore,
            handle,
            seed: None,
        }
    }

    /// Writes `seed` to the datastore when no roles are stored yet.
    #[must_use]
    pub fn with_seed(mut self, seed: RoleCatalog) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns the handle this watcher publishes to.
    pub fn handle(&self) -> &CatalogHandle {
        &self.handle
    }

    /// Stores the seed catalog if the `roles` subtree is absent.
    ///
    /// Returns `true` if this call wrote the seed. Concurrent callers race
    /// on compare-and-set, so at most one of them seeds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the datastore write fails.
    pub async fn seed_if_absent(&self) -> Result<bool, StoreError> {
        let Some(seed) = &self.seed else {
            return Ok(false);
        };
        let seeded = self
            .datastore
            .compare_and_set(&DataPath::roles(), None, seed.to_value())
            .await?;
        if seeded {
            tracing::info!(roles = seed.len(), "seeded default role catalog");
        }
        Ok(seeded)
    }

    /// Seeds if needed, reads the stored catalog once and publishes it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if seeding or the read fails. The handle is
    /// left untouched in that case.
    pub async fn load(&self) -> Result<RoleCatalog, StoreError> {
        self.seed_if_absent().await?;
        let stored = self
            .datastore
            .get(&DataPath::roles())
            .await?
            .unwrap_or_default();
        let catalog = RoleCatalog::from_value(&stored);
        self.handle.publish(catalog.clone());
        Ok(catalog)
    }

    /// Seeds if needed, then publishes every change of stored roles until
    /// the datastore closes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when seeding or the watch fails;
    /// [`StoreError::Closed`] when the datastore goes away.
    pub async fn run(self) -> Result<(), StoreError> {
        self.seed_if_absent().await?;
        let mut watch = self.datastore.watch(&DataPath::roles()).await?;
        while let Some(next) = watch.next().await {
            let stored = next?;
            self.handle.publish(RoleCatalog::from_value(&stored));
        }
        Ok(())
    }
}

impl<D: Datastore + 'static> RoleCatalogWatcher<D> {
    /// Runs the watcher on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                tracing::warn!(error = %e, "role catalog watcher stopped");
            }
        })
    }
}
