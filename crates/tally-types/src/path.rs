//! Datastore paths.
//!
//! The datastore is one hierarchical tree addressed by `/`-separated paths:
//!
//! ```text
//! <collection>/<record-id>/<field>   collections
//! counters/<counter-name>            integer counters
//! roles/<role-name>/<module>/<action> permission sets
//! users/<user-id>                    user records
//! ```

use crate::{
    validate_key, CollectionName, CounterName, KeyError, RecordId, RoleName, UserId,
    COUNTERS_ROOT, ROLES_ROOT, USERS_ROOT,
};
use std::fmt;

/// A validated path into the datastore tree.
///
/// Every segment satisfies [`validate_key`]. The empty path addresses the
/// root of the tree.
///
/// # Example
///
/// ```
/// use tally_types::{CollectionName, DataPath, RecordId};
///
/// let employees = CollectionName::parse("employees").unwrap();
/// let e1 = RecordId::parse("e1").unwrap();
///
/// let path = DataPath::record(&employees, &e1);
/// assert_eq!(path.to_string(), "employees/e1");
/// assert_eq!(path.segments(), ["employees", "e1"]);
///
/// assert_eq!(DataPath::parse("employees/e1").unwrap(), path);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DataPath {
    segments: Vec<String>,
}

impl DataPath {
    /// Returns the root path.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a `/`-separated path. Leading and trailing slashes are
    /// ignored; empty inner segments are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if any segment is invalid.
    pub fn parse(path: &str) -> Result<Self, KeyError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            validate_key(segment)?;
            segments.push(segment.to_string());
        }
        Ok(Self { segments })
    }

    /// Path of a whole collection.
    #[must_use]
    pub fn collection(name: &CollectionName) -> Self {
        Self {
            segments: vec![name.as_str().to_string()],
        }
    }

    /// Path of one record inside a collection.
    #[must_use]
    pub fn record(collection: &CollectionName, id: &RecordId) -> Self {
        Self {
            segments: vec![collection.as_str().to_string(), id.as_str().to_string()],
        }
    }

    /// Path of a counter.
    #[must_use]
    pub fn counter(name: &CounterName) -> Self {
        Self {
            segments: vec![COUNTERS_ROOT.to_string(), name.as_str().to_string()],
        }
    }

    /// Path of the whole role catalog.
    #[must_use]
    pub fn roles() -> Self {
        Self {
            segments: vec![ROLES_ROOT.to_string()],
        }
    }

    /// Path of one role's permission set.
    #[must_use]
    pub fn role(name: &RoleName) -> Self {
        Self {
            segments: vec![ROLES_ROOT.to_string(), name.as_str().to_string()],
        }
    }

    /// Path of one user record.
    #[must_use]
    pub fn user(id: &UserId) -> Self {
        Self {
            segments: vec![USERS_ROOT.to_string(), id.as_str().to_string()],
        }
    }

    /// Returns a new path with `key` appended.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if `key` is not a valid segment.
    pub fn child(&self, key: &str) -> Result<Self, KeyError> {
        validate_key(key)?;
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Ok(Self { segments })
    }

    /// Returns the parent path, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// Returns the last segment, or `None` for the root.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns `true` for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `true` if `self` equals `other` or lies beneath it.
    #[must_use]
    pub fn starts_with(&self, other: &Self) -> bool {
        self.segments.starts_with(&other.segments)
    }
}

impl fmt::Display for DataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}
