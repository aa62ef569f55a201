//! Role catalog load state.
//!
//! ```text
//!   Unloaded ──publish()──► Ready(catalog)
//!                             │  ▲
//!                             └──┘ publish() (refresh)
//! ```
//!
//! There is no way back to `Unloaded`: once a catalog has been seen, a
//! failed refresh keeps serving the last good one.

use crate::RoleCatalog;
use parking_lot::RwLock;
use std::sync::Arc;

/// Load state of the role catalog.
#[derive(Debug, Clone, Default)]
pub enum CatalogState {
    /// No catalog fetched yet; every check denies.
    #[default]
    Unloaded,
    /// Catalog available.
    Ready(Arc<RoleCatalog>),
}

impl CatalogState {
    /// Returns `true` once a catalog has been published.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Shared, swappable handle to the current catalog state.
///
/// Cloning the handle shares the state. Readers take a short read lock and
/// clone the inner `Arc`, so a check never blocks a refresh for longer than
/// the pointer swap.
///
/// # Example
///
/// ```
/// use tally_auth::{CatalogHandle, RoleCatalog};
///
/// let handle = CatalogHandle::new();
/// assert!(!handle.is_ready());
///
/// handle.publish(RoleCatalog::new());
/// assert!(handle.is_ready());
/// assert!(handle.current().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CatalogHandle {
    state: Arc<RwLock<CatalogState>>,
}

impl CatalogHandle {
    /// Creates a handle in the `Unloaded` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a handle that is already `Ready`.
    #[must_use]
    pub fn ready(catalog: RoleCatalog) -> Self {
        let handle = Self::new();
        handle.publish(catalog);
        handle
    }

    /// Replaces the current catalog, moving to `Ready`.
    pub fn publish(&self, catalog: RoleCatalog) {
        let roles = catalog.len();
        let was_ready = {
            let mut state = self.state.write();
            let was_ready = state.is_ready();
            *state = CatalogState::Ready(Arc::new(catalog));
            was_ready
        };
        if was_ready {
            tracing::debug!(roles, "role catalog refreshed");
        } else {
            tracing::info!(roles, "role catalog ready");
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> CatalogState {
        self.state.read().clone()
    }

    /// Returns the current catalog, or `None` while unloaded.
    #[must_use]
    pub fn current(&self) -> Option<Arc<RoleCatalog>> {
        match &*self.state.read() {
            CatalogState::Ready(catalog) => Some(Arc::clone(catalog)),
            CatalogState::Unloaded => None,
        }
    }

    /// Returns `true` once a catalog has been published.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.read().is_ready()
    }
}
