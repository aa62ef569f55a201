//! Access denied error.
//!
//! [`AccessDenied`] is only produced when a caller explicitly asks for a
//! `Result` (see [`Decision::into_result`](crate::Decision::into_result)).
//! Plain `can()` checks return `bool`.

use crate::DenyReason;
use tally_types::ErrorCode;
use thiserror::Error;

/// A permission check failed.
///
/// # Example
///
/// ```
/// use tally_auth::{AccessDenied, DenyReason};
/// use tally_types::ErrorCode;
///
/// let err = AccessDenied::from_reason(DenyReason::Loading, Some("cashier"), "view", "sales_pos");
/// assert_eq!(err.code(), "AUTH_CATALOG_LOADING");
/// assert!(err.is_recoverable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// Role catalog not loaded yet; retry once it is ready.
    #[error("permissions are still loading: '{action}' on '{module}'")]
    CatalogLoading { action: String, module: String },

    /// No role is resolved for the caller.
    #[error("no role resolved for '{action}' on '{module}'")]
    NoRole { action: String, module: String },

    /// Role exists (or not) but is not allowed the action.
    #[error("role '{role}' may not '{action}' on '{module}' ({reason})")]
    Forbidden {
        role: String,
        action: String,
        module: String,
        reason: DenyReason,
    },
}

impl AccessDenied {
    /// Builds the error matching a deny reason.
    #[must_use]
    pub fn from_reason(reason: DenyReason, role: Option<&str>, action: &str, module: &str) -> Self {
        let action = action.to_string();
        let module = module.to_string();
        match (reason, role) {
            (DenyReason::Loading, _) => Self::CatalogLoading { action, module },
            (DenyReason::NoRole, _) | (_, None) => Self::NoRole { action, module },
            (reason, Some(role)) => Self::Forbidden {
                role: role.to_string(),
                action,
                module,
                reason,
            },
        }
    }
}

impl ErrorCode for AccessDenied {
    fn code(&self) -> &'static str {
        match self {
            Self::CatalogLoading { .. } => "AUTH_CATALOG_LOADING",
            Self::NoRole { .. } => "AUTH_NO_ROLE",
            Self::Forbidden { .. } => "AUTH_FORBIDDEN",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::CatalogLoading { .. })
    }
}
