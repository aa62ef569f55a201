//! Assembled back-office runtime.
//!
//! [`Backoffice`] wires a file-backed [`MemoryDatastore`] to the collection
//! store, the counter allocator and the permission evaluator according to a
//! [`TallyConfig`].

use crate::config::{ConfigError, TallyConfig};
use crate::counter::{AllocationError, DocumentNumber};
use crate::roles::RoleCatalogWatcher;
use crate::store::{CollectionStore, MemoryDatastore, SnapshotLock, StoreError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tally_auth::{CatalogHandle, ModuleCatalog, PermissionEvaluator, RoleCatalog, RoleScope};
use tally_types::{CounterName, ErrorCode, RoleName};
use thiserror::Error;
use tokio::task::JoinHandle;

/// Unified runtime error.
///
/// Collects all internal errors into a single type for the binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Datastore error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Counter allocation error.
    #[error("counter error: {0}")]
    Counter(#[from] AllocationError),
}

impl ErrorCode for AppError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "APP_CONFIG_ERROR",
            Self::Store(e) => e.code(),
            Self::Counter(e) => e.code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) => false,
            Self::Store(e) => e.is_recoverable(),
            Self::Counter(e) => e.is_recoverable(),
        }
    }
}

/// A running back-office: datastore, collections, counters, permissions.
///
/// A back-office opened from a file holds the exclusive [`SnapshotLock`]
/// on it until the last clone is dropped, so one load, mutate and save
/// cycle never interleaves with another process on the same file.
///
/// # Example
///
/// ```
/// use tally_runtime::{config::TallyConfig, Backoffice};
/// use tally_types::{CollectionName, CounterName, RoleName};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let mut config = TallyConfig::default();
/// config.data.path = Some(dir.path().join("data.json"));
///
/// let office = Backoffice::open(config).await?;
/// let cashier = office.scope(Some(RoleName::parse("cashier")?));
/// assert!(cashier.can("add", "sales_pos"));
///
/// let n = office.next_counter_value(&CounterName::parse("invoice")?, None).await?;
/// assert_eq!(n, 1000);
///
/// office.save().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Backoffice {
    config: TallyConfig,
    data_path: PathBuf,
    datastore: MemoryDatastore,
    store: CollectionStore<MemoryDatastore>,
    evaluator: PermissionEvaluator,
    lock: Option<Arc<SnapshotLock>>,
}

impl Backoffice {
    /// Locks the data file, then loads the datastore snapshot and the role
    /// catalog.
    ///
    /// Waits while another process holds the data file. When
    /// `auth.seed_default_roles` is set and no roles are stored, the default
    /// catalog is written first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] if the configuration is invalid, or the snapshot
    /// cannot be locked or read.
    pub async fn open(config: TallyConfig) -> Result<Self, AppError> {
        let data_path = config.data.resolved_path();
        let lock = SnapshotLock::acquire(&data_path).await?;
        let datastore = MemoryDatastore::load(&data_path).await?;

        let mut office = Self::with_datastore(config, data_path, datastore).await?;
        office.lock = Some(Arc::new(lock));
        Ok(office)
    }

    /// Builds a runtime over an existing datastore.
    ///
    /// No file lock is taken; the caller owns exclusive access to
    /// `data_path`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] if the configuration is invalid or loading roles fails.
    pub async fn with_datastore(
        config: TallyConfig,
        data_path: impl Into<PathBuf>,
        datastore: MemoryDatastore,
    ) -> Result<Self, AppError> {
        let privileged = config.auth.privileged()?;
        let modules = ModuleCatalog::retail();
        let handle = CatalogHandle::new();

        let mut watcher = RoleCatalogWatcher::new(datastore.clone(), handle.clone());
        if config.auth.seed_default_roles {
            watcher = watcher.with_seed(RoleCatalog::default_seed(&modules));
        }
        watcher.load().await?;

        let store =
            CollectionStore::with_counter_attempts(datastore.clone(), config.counter.max_attempts);
        let evaluator = PermissionEvaluator::new(modules, privileged, handle);

        Ok(Self {
            config,
            data_path: data_path.into(),
            datastore,
            store,
            evaluator,
            lock: None,
        })
    }

    /// Returns the effective configuration.
    #[must_use]
    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    /// Returns the snapshot file path.
    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Returns the datastore.
    #[must_use]
    pub fn datastore(&self) -> &MemoryDatastore {
        &self.datastore
    }

    /// Returns true while this runtime holds the data file lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    /// Returns the collection store.
    #[must_use]
    pub fn store(&self) -> &CollectionStore<MemoryDatastore> {
        &self.store
    }

    /// Returns the permission evaluator.
    #[must_use]
    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    /// Binds the evaluator to a role.
    #[must_use]
    pub fn scope(&self, role: Option<RoleName>) -> RoleScope {
        self.evaluator.for_role(role)
    }

    /// Keeps the role catalog in sync with the datastore on a background task.
    pub fn watch_roles(&self) -> JoinHandle<()> {
        RoleCatalogWatcher::new(self.datastore.clone(), self.evaluator.catalog().clone()).spawn()
    }

    /// Allocates the next counter value; `start_from` defaults to
    /// `counter.start_from`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] on failure.
    pub async fn next_counter_value(
        &self,
        counter: &CounterName,
        start_from: Option<i64>,
    ) -> Result<i64, AllocationError> {
        let start_from = start_from.unwrap_or(self.config.counter.start_from);
        self.store.next_counter_value(counter, start_from).await
    }

    /// Allocates the next counter value as a prefixed document number.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError`] on failure.
    pub async fn next_document_number(
        &self,
        counter: &CounterName,
        start_from: Option<i64>,
        prefix: &str,
    ) -> Result<DocumentNumber, AllocationError> {
        let start_from = start_from.unwrap_or(self.config.counter.start_from);
        self.store
            .counters()
            .next_document_number(counter, start_from, prefix)
            .await
    }

    /// Writes the datastore snapshot to the data file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persist`] on I/O failure.
    pub async fn save(&self) -> Result<(), StoreError> {
        self.datastore.save(&self.data_path).await
    }
}
