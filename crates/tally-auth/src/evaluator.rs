//! The standard permission evaluator.
//!
//! # Evaluation Order
//!
//! ```text
//! catalog Unloaded ─────────────► Denied(Loading)
//! no role ──────────────────────► Denied(NoRole)
//! privileged role ──────────────► Privileged        (stored data ignored)
//! action not declared by module ► Denied(UndeclaredAction)
//! role not in catalog ──────────► Denied(UnknownRole)
//! module not in role's set ─────► Denied(ModuleNotGranted)
//! action absent / false ────────► Denied(ActionNotGranted)
//! otherwise ────────────────────► Granted
//! ```
//!
//! Every level defaults to deny.

use crate::{
    AccessDenied, Action, CatalogHandle, Decision, DenyReason, ModuleCatalog, PermissionPolicy,
    PrivilegedRoles,
};
use std::sync::Arc;
use tally_types::RoleName;

/// Evaluates permission queries against the live role catalog.
///
/// Cheap to clone; clones share the module catalog and the catalog handle.
///
/// # Example
///
/// ```
/// use tally_auth::{Action, CatalogHandle, ModuleCatalog, PermissionEvaluator,
///                  PermissionSet, PrivilegedRoles, RoleCatalog};
/// use tally_types::RoleName;
///
/// let cashier = RoleName::parse("cashier").unwrap();
/// let catalog = RoleCatalog::new().with_role(
///     cashier.clone(),
///     PermissionSet::new().grant("sales_invoices", &[Action::View, Action::Add]),
/// );
///
/// let evaluator = PermissionEvaluator::new(
///     ModuleCatalog::retail(),
///     PrivilegedRoles::default(),
///     CatalogHandle::ready(catalog),
/// );
///
/// let scope = evaluator.for_role(Some(cashier));
/// assert!(scope.can("add", "sales_invoices"));
/// assert!(!scope.can("delete", "sales_invoices"));
/// assert!(!scope.can("view", "unknown_module"));
/// ```
#[derive(Debug, Clone)]
pub struct PermissionEvaluator {
    modules: Arc<ModuleCatalog>,
    privileged: Arc<PrivilegedRoles>,
    catalog: CatalogHandle,
}

impl PermissionEvaluator {
    /// Creates an evaluator over a module catalog and a live role catalog.
    #[must_use]
    pub fn new(modules: ModuleCatalog, privileged: PrivilegedRoles, catalog: CatalogHandle) -> Self {
        Self {
            modules: Arc::new(modules),
            privileged: Arc::new(privileged),
            catalog,
        }
    }

    /// Returns the catalog handle this evaluator reads.
    #[must_use]
    pub fn catalog(&self) -> &CatalogHandle {
        &self.catalog
    }

    /// Returns the module catalog.
    #[must_use]
    pub fn modules(&self) -> &ModuleCatalog {
        &self.modules
    }

    /// Returns `true` while the role catalog has not been loaded.
    ///
    /// Callers show a loading indicator and deny everything meanwhile.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.catalog.is_ready()
    }

    /// Binds the evaluator to the caller's current role.
    #[must_use]
    pub fn for_role(&self, role: Option<RoleName>) -> RoleScope {
        RoleScope {
            evaluator: self.clone(),
            role,
        }
    }

    /// Typed variant of [`PermissionPolicy::explain`].
    #[must_use]
    pub fn explain_action(&self, role: Option<&RoleName>, action: Action, module: &str) -> Decision {
        self.evaluate(role, Some(action), module)
    }

    // `action` is `None` when the caller passed a string outside the action
    // vocabulary; it is refused at the same step as an undeclared action.
    fn evaluate(&self, role: Option<&RoleName>, action: Option<Action>, module: &str) -> Decision {
        let Some(catalog) = self.catalog.current() else {
            return Decision::Denied(DenyReason::Loading);
        };
        let Some(role) = role else {
            return Decision::Denied(DenyReason::NoRole);
        };
        if self.privileged.contains(role) {
            return Decision::Privileged;
        }
        let Some(action) = action.filter(|a| self.modules.declares(module, *a)) else {
            return Decision::Denied(DenyReason::UndeclaredAction);
        };
        let Some(set) = catalog.get(role) else {
            return Decision::Denied(DenyReason::UnknownRole);
        };
        if !set.has_module(module) {
            return Decision::Denied(DenyReason::ModuleNotGranted);
        }
        if set.allows(module, action.as_str()) {
            Decision::Granted
        } else {
            Decision::Denied(DenyReason::ActionNotGranted)
        }
    }
}

impl PermissionPolicy for PermissionEvaluator {
    fn explain(&self, role: Option<&RoleName>, action: &str, module: &str) -> Decision {
        let decision = self.evaluate(role, action.parse().ok(), module);
        tracing::debug!(
            role = role.map(RoleName::as_str),
            action,
            module,
            decision = decision.status_str(),
            reason = decision.deny_reason().map(|r| r.as_str()),
            "permission check"
        );
        decision
    }
}

/// An evaluator bound to one caller's role.
///
/// This is what UI-facing code holds: `scope.can("delete", "customers")`.
#[derive(Debug, Clone)]
pub struct RoleScope {
    evaluator: PermissionEvaluator,
    role: Option<RoleName>,
}

impl RoleScope {
    /// Returns the bound role.
    #[must_use]
    pub fn role(&self) -> Option<&RoleName> {
        self.role.as_ref()
    }

    /// Returns `true` if the bound role may perform `action` on `module`.
    #[must_use]
    pub fn can(&self, action: &str, module: &str) -> bool {
        self.evaluator.can(self.role.as_ref(), action, module)
    }

    /// Returns the decision with its reason.
    #[must_use]
    pub fn explain(&self, action: &str, module: &str) -> Decision {
        self.evaluator.explain(self.role.as_ref(), action, module)
    }

    /// Returns `Err` if the bound role may not perform `action`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied`] on denial.
    pub fn require(&self, action: &str, module: &str) -> Result<(), AccessDenied> {
        self.evaluator.require(self.role.as_ref(), action, module)
    }

    /// Returns `true` while the role catalog has not been loaded.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.evaluator.is_loading()
    }
}
