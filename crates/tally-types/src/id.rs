//! Identifier types.
//!
//! Each identifier is a validated string newtype. They serialize as plain
//! strings and re-validate on deserialization, so a malformed key read from
//! disk or the wire is rejected instead of silently accepted.

use crate::{validate_collection_name, validate_key, KeyError, TryNew};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Defines a validated key newtype with the common trait surface.
macro_rules! key_type {
    ($(#[$meta:meta])* $name:ident) => {
        key_type!($(#[$meta])* $name, validate_key);
    };
    ($(#[$meta:meta])* $name:ident, $validate:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Returns the key as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryNew for $name {
            type Error = KeyError;
            type Args = String;

            fn try_new(value: String) -> Result<Self, Self::Error> {
                $validate(&value)?;
                Ok(Self(value))
            }
        }

        impl $name {
            /// Validates and wraps any string-like value.
            ///
            /// # Errors
            ///
            /// Returns [`KeyError`] if the value is not a valid key.
            pub fn parse(value: impl Into<String>) -> Result<Self, KeyError> {
                <Self as TryNew>::try_new(value.into())
            }
        }

        impl TryFrom<String> for $name {
            type Error = KeyError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                <Self as TryNew>::try_new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = KeyError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                <Self as TryNew>::try_new(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

key_type!(
    /// Name of a collection, e.g. `employees` or `stockInRecords`.
    ///
    /// The runtime roots `counters`, `roles` and `users` are rejected.
    CollectionName,
    validate_collection_name
);

key_type!(
    /// Datastore-assigned identifier of a record within its collection.
    ///
    /// Identifiers created by [`RecordId::generate`] are UUID v7 in simple
    /// form, so they sort by creation time.
    RecordId
);

key_type!(
    /// Name of an integer counter, e.g. `customerPayment`.
    CounterName
);

key_type!(
    /// Name of a role, e.g. `accountant` or `مسؤول`.
    RoleName
);

key_type!(
    /// Identifier of an application user record.
    UserId
);

impl RecordId {
    /// Generates a fresh, time-ordered identifier.
    ///
    /// # Example
    ///
    /// ```
    /// use tally_types::RecordId;
    ///
    /// let a = RecordId::generate();
    /// let b = RecordId::generate();
    /// assert_ne!(a, b);
    /// ```
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }
}

/// Separator placed between the parts of a scoped counter name.
pub(crate) const SCOPE_SEPARATOR: char = ':';

impl CounterName {
    /// Builds a composite counter name from a base and scoping parts.
    ///
    /// Parts are joined with `:` so the same inputs always produce the same
    /// key; a part that itself contains `:` is rejected, otherwise two
    /// different scopes could collapse into one sequence.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if the base or any part is not a valid key, or
    /// a part contains the separator.
    ///
    /// # Example
    ///
    /// ```
    /// use tally_types::CounterName;
    ///
    /// let daily = CounterName::scoped("posDaily", &["2024-05-01", "u42"]).unwrap();
    /// assert_eq!(daily.as_str(), "posDaily:2024-05-01:u42");
    ///
    /// assert!(CounterName::scoped("posDaily", &["a:b"]).is_err());
    /// ```
    pub fn scoped(base: &str, parts: &[&str]) -> Result<Self, KeyError> {
        validate_key(base)?;
        let mut name = base.to_string();
        for part in parts {
            validate_key(part)?;
            if let Some(found) = part.chars().find(|c| *c == SCOPE_SEPARATOR) {
                return Err(KeyError::ForbiddenChar {
                    key: (*part).to_string(),
                    found,
                });
            }
            name.push(SCOPE_SEPARATOR);
            name.push_str(part);
        }
        Self::parse(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names_round_trip_through_display() {
        let name = CollectionName::parse("stockInRecords").expect("valid collection name");
        assert_eq!(name.to_string(), "stockInRecords");
        assert_eq!(String::from(name), "stockInRecords");
    }

    #[test]
    fn invalid_names_are_rejected() {
        assert_eq!(RoleName::parse(""), Err(KeyError::Empty));
        assert!(CollectionName::parse("a/b").is_err());
        assert!(UserId::try_from("$root").is_err());
    }

    #[test]
    fn collection_names_cannot_alias_runtime_roots() {
        for root in ["counters", "roles", "users"] {
            let err = CollectionName::parse(root).expect_err("reserved root");
            assert!(matches!(err, KeyError::Reserved { ref key } if key == root));

            let from_json: Result<CollectionName, _> =
                serde_json::from_str(&format!("\"{root}\""));
            assert!(from_json.is_err());
        }
        // Other identifier types keep accepting these words.
        assert!(RoleName::parse("users").is_ok());
        assert!(CounterName::parse("roles").is_ok());
    }

    #[test]
    fn generated_record_ids_are_unique_and_valid() {
        let ids: std::collections::HashSet<_> = (0..256).map(|_| RecordId::generate()).collect();
        assert_eq!(ids.len(), 256);
        for id in &ids {
            assert!(validate_key(id.as_str()).is_ok());
        }
    }

    #[test]
    fn generated_record_ids_sort_by_creation() {
        let first = RecordId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = RecordId::generate();
        assert!(first < second);
    }

    #[test]
    fn scoped_counter_names_are_deterministic() {
        let a = CounterName::scoped("posDaily", &["2024-05-01", "u1"]).expect("valid scope");
        let b = CounterName::scoped("posDaily", &["2024-05-01", "u1"]).expect("valid scope");
        let c = CounterName::scoped("posDaily", &["2024-05-01", "u2"]).expect("valid scope");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn scoped_counter_rejects_separator_in_part() {
        let err = CounterName::scoped("posDaily", &["2024:05"]).expect_err("separator in part");
        assert!(matches!(err, KeyError::ForbiddenChar { found: ':', .. }));
    }

    #[test]
    fn scoped_counter_without_parts_is_base() {
        let name = CounterName::scoped("invoice", &[]).expect("valid base");
        assert_eq!(name.as_str(), "invoice");
    }

    #[test]
    fn serde_revalidates() {
        let ok: RoleName = serde_json::from_str("\"cashier\"").expect("valid role");
        assert_eq!(ok.as_str(), "cashier");

        let bad: Result<RoleName, _> = serde_json::from_str("\"a.b\"");
        assert!(bad.is_err());

        let json = serde_json::to_string(&ok).expect("serialize role");
        assert_eq!(json, "\"cashier\"");
    }
}
