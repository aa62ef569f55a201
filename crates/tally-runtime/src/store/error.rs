//! Datastore and subscription errors.

use std::path::PathBuf;
use tally_types::{ErrorCode, KeyError};
use thiserror::Error;

/// A datastore write or read failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A path segment, record id or field name is not a valid key.
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    /// The addressed node does not exist.
    #[error("no value at '{path}'")]
    NotFound { path: String },

    /// The addressed node exists but is not an object, so fields cannot be merged into it.
    #[error("value at '{path}' is not an object")]
    NotAnObject { path: String },

    /// A write payload was not a JSON object.
    #[error("payload must be a JSON object, got {found}")]
    InvalidPayload { found: &'static str },

    /// Could not find a free key for a new record.
    #[error("no free key under '{path}' after {attempts} attempts")]
    KeyCollision { path: String, attempts: u32 },

    /// The datastore has been closed.
    #[error("datastore is closed")]
    Closed,

    /// Reading or writing the snapshot file failed.
    #[error("failed to persist datastore to '{path}': {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cross-process lock on the snapshot file could not be taken.
    #[error("failed to lock '{path}': {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The snapshot file is not valid JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Creates a NotFound error.
    pub fn not_found(path: impl ToString) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    /// Creates a NotAnObject error.
    pub fn not_an_object(path: impl ToString) -> Self {
        Self::NotAnObject {
            path: path.to_string(),
        }
    }

    /// Creates a Persist error.
    pub fn persist(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }

    /// Creates a Lock error.
    pub fn lock(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Lock {
            path: path.into(),
            source,
        }
    }
}

impl ErrorCode for StoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidKey(_) => "STORE_INVALID_KEY",
            Self::NotFound { .. } => "STORE_NOT_FOUND",
            Self::NotAnObject { .. } => "STORE_NOT_AN_OBJECT",
            Self::InvalidPayload { .. } => "STORE_INVALID_PAYLOAD",
            Self::KeyCollision { .. } => "STORE_KEY_COLLISION",
            Self::Closed => "STORE_CLOSED",
            Self::Persist { .. } => "STORE_PERSIST",
            Self::Lock { .. } => "STORE_LOCK",
            Self::Serialization(_) => "STORE_SERIALIZATION",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::KeyCollision { .. } | Self::Persist { .. } | Self::Lock { .. }
        )
    }
}

/// A live subscription failed. The subscription ends after delivering it.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// The datastore went away while the subscription was active.
    #[error("subscription to '{collection}' closed by the datastore")]
    Closed { collection: String },

    /// A child of the collection is not a record object.
    #[error("collection '{collection}' holds a malformed record at '{key}'")]
    Malformed { collection: String, key: String },

    /// Establishing the subscription failed.
    #[error("failed to subscribe to '{collection}': {source}")]
    Watch {
        collection: String,
        #[source]
        source: StoreError,
    },
}

impl ErrorCode for SubscriptionError {
    fn code(&self) -> &'static str {
        match self {
            Self::Closed { .. } => "SUBSCRIPTION_CLOSED",
            Self::Malformed { .. } => "SUBSCRIPTION_MALFORMED",
            Self::Watch { .. } => "SUBSCRIPTION_WATCH_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Closed { .. } | Self::Watch { .. })
    }
}
