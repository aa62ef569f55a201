//! Identity boundary.
//!
//! Resolves an opaque caller token to a [`User`] carrying the role that the
//! permission evaluator consumes. How tokens are issued is outside this
//! crate; implementations only map token → user.

use crate::store::{Datastore, StoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tally_types::{ErrorCode, RoleName, UserId};
use thiserror::Error;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user identifier.
    pub id: UserId,

    /// Assigned role, if any. A user without a role is denied everything.
    pub role: Option<RoleName>,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl User {
    /// Creates a user with a role and no display name.
    #[must_use]
    pub fn new(id: UserId, role: Option<RoleName>) -> Self {
        Self {
            id,
            role,
            name: None,
        }
    }
}

/// Identity resolution failed.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The token is malformed.
    #[error("invalid identity token")]
    InvalidToken,

    /// No user matches the token.
    #[error("unknown user '{0}'")]
    UnknownUser(String),

    /// The stored user record is not an object.
    #[error("user record '{0}' is malformed")]
    MalformedUser(String),

    /// The backing datastore failed.
    #[error("identity lookup failed: {0}")]
    Store(#[from] StoreError),
}

impl ErrorCode for IdentityError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidToken => "IDENTITY_INVALID_TOKEN",
            Self::UnknownUser(_) => "IDENTITY_UNKNOWN_USER",
            Self::MalformedUser(_) => "IDENTITY_MALFORMED_USER",
            Self::Store(_) => "IDENTITY_STORE",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_recoverable())
    }
}

/// Maps caller tokens to users.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves `token` to a user.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError`] if the token is invalid or unknown.
    async fn resolve(&self, token: &str) -> Result<User, IdentityError>;
}

/// Resolves tokens as user ids against `users/<id>` in a datastore.
///
/// The stored record's `role` field becomes the user's role; a missing or
/// invalid role resolves to `None`.
#[derive(Debug, Clone)]
pub struct StoreIdentity<D> {
    datastore: D,
}

impl<D: Datastore> StoreIdentity<D> {
    /// Creates a provider over `datastore`.
    pub fn new(datastore: D) -> Self {
        Self { datastore }
    }
}

#[async_trait]
impl<D: Datastore> IdentityProvider for StoreIdentity<D> {
    async fn resolve(&self, token: &str) -> Result<User, IdentityError> {
        let id = UserId::parse(token).map_err(|_| IdentityError::InvalidToken)?;
        let stored = self
            .datastore
            .get(&tally_types::DataPath::user(&id))
            .await?
            .ok_or_else(|| IdentityError::UnknownUser(id.to_string()))?;
        let Value::Object(record) = stored else {
            return Err(IdentityError::MalformedUser(id.to_string()));
        };

        let role = match record.get("role").and_then(Value::as_str) {
            Some(raw) => match RoleName::parse(raw) {
                Ok(role) => Some(role),
                Err(e) => {
                    tracing::warn!(user = %id, role = raw, error = %e, "ignoring invalid role");
                    None
                }
            },
            None => None,
        };
        let name = record
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(User { id, role, name })
    }
}

/// In-memory token → user map.
///
/// # Example
///
/// ```
/// use tally_runtime::identity::{IdentityProvider, StaticIdentity, User};
/// use tally_types::{RoleName, UserId};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cashier = User::new(UserId::parse("u1").unwrap(), Some(RoleName::parse("cashier").unwrap()));
/// let identity = StaticIdentity::new().with_user("token-1", cashier.clone());
///
/// assert_eq!(identity.resolve("token-1").await.unwrap(), cashier);
/// assert!(identity.resolve("token-2").await.is_err());
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    users: HashMap<String, User>,
}

impl StaticIdentity {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a token.
    #[must_use]
    pub fn with_user(mut self, token: impl Into<String>, user: User) -> Self {
        self.users.insert(token.into(), user);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn resolve(&self, token: &str) -> Result<User, IdentityError> {
        self.users
            .get(token)
            .cloned()
            .ok_or_else(|| IdentityError::UnknownUser(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDatastore;
    use serde_json::json;
    use tally_types::assert_error_codes;

    fn provider(users: Value) -> StoreIdentity<MemoryDatastore> {
        StoreIdentity::new(MemoryDatastore::from_value(json!({ "users": users })))
    }

    #[tokio::test]
    async fn resolves_stored_user() {
        let identity = provider(json!({"u1": {"role": "cashier", "name": "Ali"}}));
        let user = identity.resolve("u1").await.unwrap();

        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.role.as_ref().map(RoleName::as_str), Some("cashier"));
        assert_eq!(user.name.as_deref(), Some("Ali"));
    }

    #[tokio::test]
    async fn missing_or_invalid_role_is_none() {
        let identity = provider(json!({
            "u1": {"name": "Ali"},
            "u2": {"role": "a/b"},
            "u3": {"role": 7},
        }));
        for token in ["u1", "u2", "u3"] {
            assert!(identity.resolve(token).await.unwrap().role.is_none());
        }
    }

    #[tokio::test]
    async fn failures() {
        let identity = provider(json!({"u1": "not an object"}));

        assert!(matches!(
            identity.resolve("").await,
            Err(IdentityError::InvalidToken)
        ));
        assert!(matches!(
            identity.resolve("ghost").await,
            Err(IdentityError::UnknownUser(_))
        ));
        assert!(matches!(
            identity.resolve("u1").await,
            Err(IdentityError::MalformedUser(_))
        ));
    }

    #[tokio::test]
    async fn works_as_trait_object() {
        let providers: Vec<Box<dyn IdentityProvider>> = vec![
            Box::new(provider(json!({"u1": {"role": "cashier"}}))),
            Box::new(StaticIdentity::new().with_user(
                "u1",
                User::new(UserId::parse("u1").unwrap(), None),
            )),
        ];
        for p in &providers {
            assert_eq!(p.resolve("u1").await.unwrap().id.as_str(), "u1");
        }
    }

    #[test]
    fn error_codes() {
        assert_error_codes(
            &[
                IdentityError::InvalidToken,
                IdentityError::UnknownUser("x".into()),
                IdentityError::MalformedUser("x".into()),
                IdentityError::Store(StoreError::Closed),
            ],
            "IDENTITY_",
        );
    }
}
