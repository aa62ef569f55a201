//! Authorization decisions.
//!
//! A [`Decision`] is the result of evaluating one `(action, module)` pair
//! for one role. Denial is ordinary data, not an error; callers that prefer
//! `?` can convert with [`Decision::into_result`].

use crate::AccessDenied;
use std::fmt;

/// Why a check was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenyReason {
    /// Role catalog has not been loaded yet.
    Loading,
    /// No role is resolved for the current user.
    NoRole,
    /// The role has no entry in the catalog.
    UnknownRole,
    /// The module does not declare this action (or the action is unknown).
    UndeclaredAction,
    /// The role's permission set has no entry for the module.
    ModuleNotGranted,
    /// The action is absent, `false`, or not a boolean.
    ActionNotGranted,
}

impl DenyReason {
    /// Returns a stable lowercase label for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::NoRole => "no_role",
            Self::UnknownRole => "unknown_role",
            Self::UndeclaredAction => "undeclared_action",
            Self::ModuleNotGranted => "module_not_granted",
            Self::ActionNotGranted => "action_not_granted",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a permission check.
///
/// # Variants
///
/// - `Granted`: stored permission data allows the action
/// - `Privileged`: the role is privileged; stored data was not consulted
/// - `Denied`: refused, with the level at which the lookup stopped
///
/// # Example
///
/// ```
/// use tally_auth::{Decision, DenyReason};
///
/// assert!(Decision::Granted.is_allowed());
/// assert!(Decision::Privileged.is_allowed());
///
/// let denied = Decision::Denied(DenyReason::ModuleNotGranted);
/// assert!(!denied.is_allowed());
/// assert_eq!(denied.status_str(), "denied");
/// assert_eq!(denied.deny_reason(), Some(DenyReason::ModuleNotGranted));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Allowed by stored permission data.
    Granted,
    /// Allowed because the role is privileged.
    Privileged,
    /// Refused.
    Denied(DenyReason),
}

impl Decision {
    /// Returns `true` for `Granted` and `Privileged`.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Denied(_))
    }

    /// Returns the deny reason, if denied.
    #[must_use]
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Self::Denied(reason) => Some(*reason),
            Self::Granted | Self::Privileged => None,
        }
    }

    /// Returns the status as a string ("granted", "privileged", "denied").
    #[must_use]
    pub fn status_str(&self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Privileged => "privileged",
            Self::Denied(_) => "denied",
        }
    }

    /// Converts a denial into [`AccessDenied`] for the given pair.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied`] if the decision is `Denied`.
    pub fn into_result(
        self,
        role: Option<&str>,
        action: &str,
        module: &str,
    ) -> Result<(), AccessDenied> {
        match self {
            Self::Granted | Self::Privileged => Ok(()),
            Self::Denied(reason) => Err(AccessDenied::from_reason(reason, role, action, module)),
        }
    }
}
