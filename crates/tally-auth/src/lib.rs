//! Role-based permission model for tally.
//!
//! Answers one question: may the caller's role perform `action` on `module`?
//!
//! # Three-Level Default Deny
//!
//! ```text
//! Allowed = Declared(ModuleCatalog) ∩ Granted(RoleCatalog[role]) ∪ Privileged(role)
//! ```
//!
//! | Layer | Type | Controls |
//! |-------|------|----------|
//! | [`ModuleCatalog`] | Static registry | Which actions exist for a module |
//! | [`RoleCatalog`] / [`PermissionSet`] | Stored data | Which of those a role holds |
//! | [`PrivilegedRoles`] | Configuration | Roles that bypass stored data |
//!
//! The live catalog sits behind a [`CatalogHandle`]. Until the first catalog
//! is published the handle is `Unloaded` and every check denies.
//!
//! # Crate Architecture
//!
//! ```text
//! tally-types  (RoleName, ErrorCode)
//!     ↑
//! tally-auth  ◄── THIS CRATE
//! (Action, ModuleCatalog, RoleCatalog, PermissionEvaluator)
//!     ↑
//! tally-runtime (RoleCatalogWatcher keeps the CatalogHandle current)
//! ```
//!
//! # Example
//!
//! ```
//! use tally_auth::{CatalogHandle, ModuleCatalog, PermissionEvaluator,
//!                  PrivilegedRoles, RoleCatalog};
//! use tally_types::RoleName;
//!
//! let modules = ModuleCatalog::retail();
//! let handle = CatalogHandle::new();
//! let evaluator = PermissionEvaluator::new(modules.clone(), PrivilegedRoles::default(), handle.clone());
//!
//! let cashier = evaluator.for_role(Some(RoleName::parse("cashier").unwrap()));
//! assert!(cashier.is_loading());
//! assert!(!cashier.can("add", "sales_pos"));
//!
//! handle.publish(RoleCatalog::default_seed(&modules));
//! assert!(cashier.can("add", "sales_pos"));
//! assert!(!cashier.can("view", "hr_payroll"));
//! ```

pub mod action;
pub mod catalog;
pub mod decision;
pub mod error;
pub mod evaluator;
pub mod module;
pub mod permission_set;
pub mod policy;
pub mod privileged;
pub mod state;

pub use action::{Action, UnknownAction};
pub use catalog::RoleCatalog;
pub use decision::{Decision, DenyReason};
pub use error::AccessDenied;
pub use evaluator::{PermissionEvaluator, RoleScope};
pub use module::ModuleCatalog;
pub use permission_set::PermissionSet;
pub use policy::PermissionPolicy;
pub use privileged::{PrivilegedRoles, DEFAULT_PRIVILEGED_ROLES};
pub use state::{CatalogHandle, CatalogState};

pub use tally_types::RoleName;
