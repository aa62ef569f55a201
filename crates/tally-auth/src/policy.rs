//! Permission policy trait.
//!
//! [`PermissionPolicy`] is the seam between callers and whatever decides
//! authorization. [`PermissionEvaluator`](crate::PermissionEvaluator) is the
//! standard implementation; tests and embedded tools can supply their own.

use crate::{AccessDenied, Decision};
use tally_types::RoleName;

/// Answers `(role, action, module)` authorization queries.
///
/// Implementations must be total: every input yields a [`Decision`], and
/// nothing panics.
///
/// # Example
///
/// ```
/// use tally_auth::{Decision, DenyReason, PermissionPolicy};
/// use tally_types::RoleName;
///
/// /// Lets everyone view, nobody do anything else.
/// struct ReadOnly;
///
/// impl PermissionPolicy for ReadOnly {
///     fn explain(&self, role: Option<&RoleName>, action: &str, _module: &str) -> Decision {
///         match (role, action) {
///             (None, _) => Decision::Denied(DenyReason::NoRole),
///             (Some(_), "view") => Decision::Granted,
///             (Some(_), _) => Decision::Denied(DenyReason::ActionNotGranted),
///         }
///     }
/// }
///
/// let policy = ReadOnly;
/// let clerk = RoleName::parse("clerk").unwrap();
/// assert!(policy.can(Some(&clerk), "view", "reports"));
/// assert!(!policy.can(Some(&clerk), "delete", "reports"));
/// assert!(policy.require(Some(&clerk), "delete", "reports").is_err());
/// ```
pub trait PermissionPolicy: Send + Sync {
    /// Evaluates the query and reports why.
    fn explain(&self, role: Option<&RoleName>, action: &str, module: &str) -> Decision;

    /// Returns `true` if the query is allowed.
    fn can(&self, role: Option<&RoleName>, action: &str, module: &str) -> bool {
        self.explain(role, action, module).is_allowed()
    }

    /// Converts a denial into [`AccessDenied`].
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied`] when the query is denied.
    fn require(
        &self,
        role: Option<&RoleName>,
        action: &str,
        module: &str,
    ) -> Result<(), AccessDenied> {
        self.explain(role, action, module)
            .into_result(role.map(RoleName::as_str), action, module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DenyReason;

    struct AllowAll;

    impl PermissionPolicy for AllowAll {
        fn explain(&self, _role: Option<&RoleName>, _action: &str, _module: &str) -> Decision {
            Decision::Granted
        }
    }

    struct DenyAll;

    impl PermissionPolicy for DenyAll {
        fn explain(&self, _role: Option<&RoleName>, _action: &str, _module: &str) -> Decision {
            Decision::Denied(DenyReason::ActionNotGranted)
        }
    }

    fn clerk() -> RoleName {
        RoleName::parse("clerk").expect("valid role")
    }

    #[test]
    fn default_can_wraps_explain() {
        assert!(AllowAll.can(Some(&clerk()), "delete", "customers"));
        assert!(!DenyAll.can(Some(&clerk()), "view", "customers"));
    }

    #[test]
    fn default_require_maps_denial() {
        assert!(AllowAll.require(None, "view", "dashboard").is_ok());

        let err = DenyAll
            .require(Some(&clerk()), "view", "customers")
            .expect_err("deny-all must fail");
        assert!(matches!(err, AccessDenied::Forbidden { .. }));
    }

    #[test]
    fn trait_object_works() {
        let policy: Box<dyn PermissionPolicy> = Box::new(AllowAll);
        assert!(policy.can(None, "view", "dashboard"));
    }
}
