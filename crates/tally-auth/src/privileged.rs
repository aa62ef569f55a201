//! The privileged role set.

use std::collections::BTreeSet;
use tally_types::{KeyError, RoleName};

/// Role names that bypass stored permissions entirely.
///
/// Membership is configuration, not data: nothing read from the datastore
/// can add or remove a privileged role, and a privileged role is allowed
/// every action even when its stored permission set is empty or missing.
///
/// The default set holds `admin` and its Arabic label `مسؤول`.
///
/// # Example
///
/// ```
/// use tally_auth::PrivilegedRoles;
/// use tally_types::RoleName;
///
/// let privileged = PrivilegedRoles::default();
/// assert!(privileged.contains(&RoleName::parse("admin").unwrap()));
/// assert!(privileged.contains(&RoleName::parse("مسؤول").unwrap()));
/// assert!(!privileged.contains(&RoleName::parse("cashier").unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegedRoles {
    roles: BTreeSet<RoleName>,
}

/// Default privileged role names.
pub const DEFAULT_PRIVILEGED_ROLES: [&str; 2] = ["admin", "مسؤول"];

impl PrivilegedRoles {
    /// Builds a set from role names.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if any name is not a valid role name.
    pub fn from_names<I, S>(names: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles = names
            .into_iter()
            .map(RoleName::parse)
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self { roles })
    }

    /// A set with no privileged role; every role goes through stored data.
    #[must_use]
    pub fn none() -> Self {
        Self {
            roles: BTreeSet::new(),
        }
    }

    /// Returns `true` if `role` is privileged.
    #[must_use]
    pub fn contains(&self, role: &RoleName) -> bool {
        self.roles.contains(role)
    }

    /// Returns the privileged role names.
    pub fn iter(&self) -> impl Iterator<Item = &RoleName> {
        self.roles.iter()
    }
}

impl FromIterator<RoleName> for PrivilegedRoles {
    fn from_iter<I: IntoIterator<Item = RoleName>>(iter: I) -> Self {
        Self {
            roles: iter.into_iter().collect(),
        }
    }
}

impl Default for PrivilegedRoles {
    fn default() -> Self {
        Self {
            roles: DEFAULT_PRIVILEGED_ROLES
                .iter()
                .filter_map(|name| RoleName::parse(*name).ok())
                .collect(),
        }
    }
}
