//! Key validation shared by every identifier type.

use crate::{ErrorCode, RESERVED_ROOTS};
use thiserror::Error;

/// Characters that may never appear inside a key.
///
/// `/` separates path segments; the rest are reserved by realtime
/// datastores for query and reference syntax.
const FORBIDDEN: &[char] = &['/', '.', '#', '$', '[', ']'];

/// Maximum key length in bytes.
pub const MAX_KEY_BYTES: usize = 768;

/// Reasons a string is rejected as a key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Key is empty.
    #[error("key must not be empty")]
    Empty,

    /// Key contains a reserved character.
    #[error("key '{key}' contains forbidden character '{found}'")]
    ForbiddenChar { key: String, found: char },

    /// Key exceeds [`MAX_KEY_BYTES`].
    #[error("key exceeds {max} bytes ({len})")]
    TooLong { len: usize, max: usize },

    /// Collection name collides with a runtime-owned root.
    #[error("'{key}' is reserved and cannot name a collection")]
    Reserved { key: String },
}

impl ErrorCode for KeyError {
    fn code(&self) -> &'static str {
        match self {
            Self::Empty => "KEY_EMPTY",
            Self::ForbiddenChar { .. } => "KEY_FORBIDDEN_CHAR",
            Self::TooLong { .. } => "KEY_TOO_LONG",
            Self::Reserved { .. } => "KEY_RESERVED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Validates a single path segment.
///
/// # Errors
///
/// Returns [`KeyError`] when the key is empty, too long, or contains a
/// forbidden or control character.
///
/// # Example
///
/// ```
/// use tally_types::{validate_key, KeyError};
///
/// assert!(validate_key("stockInRecords").is_ok());
/// assert!(validate_key("مسؤول").is_ok());
/// assert_eq!(validate_key(""), Err(KeyError::Empty));
/// assert!(validate_key("a.b").is_err());
/// ```
pub fn validate_key(key: &str) -> Result<(), KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    if key.len() > MAX_KEY_BYTES {
        return Err(KeyError::TooLong {
            len: key.len(),
            max: MAX_KEY_BYTES,
        });
    }
    if let Some(found) = key
        .chars()
        .find(|c| FORBIDDEN.contains(c) || c.is_control())
    {
        return Err(KeyError::ForbiddenChar {
            key: key.to_string(),
            found,
        });
    }
    Ok(())
}

/// Validates a collection name.
///
/// On top of [`validate_key`], rejects the roots that hold counters, roles
/// and users, since records of a collection live directly under its name.
///
/// # Errors
///
/// Returns [`KeyError::Reserved`] for a runtime-owned root, or any error
/// of [`validate_key`].
///
/// # Example
///
/// ```
/// use tally_types::{validate_collection_name, KeyError};
///
/// assert!(validate_collection_name("employees").is_ok());
/// assert!(matches!(
///     validate_collection_name("counters"),
///     Err(KeyError::Reserved { .. })
/// ));
/// ```
pub fn validate_collection_name(name: &str) -> Result<(), KeyError> {
    validate_key(name)?;
    if RESERVED_ROOTS.contains(&name) {
        return Err(KeyError::Reserved {
            key: name.to_string(),
        });
    }
    Ok(())
}
