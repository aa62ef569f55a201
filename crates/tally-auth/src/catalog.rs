//! Role catalog: role name → permission set.

use crate::{Action, ModuleCatalog, PermissionSet};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tally_types::RoleName;

/// Immutable snapshot of every role's permission set.
///
/// A catalog is never mutated in place once published to evaluators; a
/// refresh builds a new catalog and swaps it in whole.
///
/// # Example
///
/// ```
/// use tally_auth::{ModuleCatalog, RoleCatalog};
/// use tally_types::RoleName;
///
/// let seed = RoleCatalog::default_seed(&ModuleCatalog::retail());
/// let cashier = RoleName::parse("cashier").unwrap();
///
/// let set = seed.get(&cashier).unwrap();
/// assert!(set.allows("sales_pos", "add"));
/// assert!(!set.allows("hr_payroll", "view"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleCatalog {
    roles: BTreeMap<RoleName, PermissionSet>,
}

impl RoleCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a catalog from the stored `roles` subtree.
    ///
    /// Role names that are not valid keys are skipped with a warning;
    /// permission sets are read leniently (see [`PermissionSet::from_value`]).
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(roles) = value.as_object() else {
            return Self::default();
        };

        let mut catalog = Self::default();
        for (name, set) in roles {
            match RoleName::parse(name.as_str()) {
                Ok(role) => {
                    catalog.roles.insert(role, PermissionSet::from_value(set));
                }
                Err(e) => {
                    tracing::warn!(role = %name, error = %e, "skipping role with invalid name");
                }
            }
        }
        catalog
    }

    /// Converts the catalog to its stored JSON form.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let roles: Map<String, Value> = self
            .roles
            .iter()
            .map(|(name, set)| (name.to_string(), set.to_value()))
            .collect();
        Value::Object(roles)
    }

    /// Adds or replaces a role.
    pub fn insert(&mut self, role: RoleName, set: PermissionSet) {
        self.roles.insert(role, set);
    }

    /// Builder-style variant of [`insert`](Self::insert).
    #[must_use]
    pub fn with_role(mut self, role: RoleName, set: PermissionSet) -> Self {
        self.insert(role, set);
        self
    }

    /// Returns a role's permission set.
    #[must_use]
    pub fn get(&self, role: &RoleName) -> Option<&PermissionSet> {
        self.roles.get(role)
    }

    /// Returns role names in sorted order.
    pub fn roles(&self) -> impl Iterator<Item = &RoleName> {
        self.roles.keys()
    }

    /// Returns the number of roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Returns `true` if there are no roles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Returns the default roles written to an empty datastore.
    ///
    /// | Role | Grants |
    /// |------|--------|
    /// | `admin` | every declared action (also privileged, see [`PrivilegedRoles`](crate::PrivilegedRoles)) |
    /// | `accountant` | sales/purchase invoices, cash, customers, suppliers, reports |
    /// | `cashier` | POS, sales invoices (no edit/delete), cash receipts, customers (view/add) |
    /// | `storekeeper` | inventory (no transfer approval), purchase invoices (view) |
    /// | `hr_manager` | HR modules |
    ///
    /// Every role also gets `dashboard.view`. Only actions declared in
    /// `modules` are written.
    #[must_use]
    pub fn default_seed(modules: &ModuleCatalog) -> Self {
        use Action::{Add, Export, Print, View};

        let all = |set: PermissionSet, module: &str| {
            let actions: Vec<Action> = modules.actions(module).collect();
            set.grant(module, &actions)
        };
        let some = |set: PermissionSet, module: &str, wanted: &[Action]| {
            let actions: Vec<Action> = wanted
                .iter()
                .copied()
                .filter(|a| modules.declares(module, *a))
                .collect();
            set.grant(module, &actions)
        };

        let admin = modules
            .modules()
            .fold(PermissionSet::new(), |set, module| all(set, module));

        let accountant = [
            "sales_invoices",
            "sales_returns",
            "purchase_invoices",
            "purchase_returns",
            "cash_accounts",
            "cash_receipts",
            "cash_payments",
            "customers",
            "suppliers",
            "reports",
        ]
        .into_iter()
        .fold(some(PermissionSet::new(), "dashboard", &[View]), all);

        let mut cashier = some(PermissionSet::new(), "dashboard", &[View]);
        cashier = some(cashier, "sales_pos", &[View, Add, Print]);
        cashier = some(cashier, "sales_invoices", &[View, Add, Print]);
        cashier = some(cashier, "cash_receipts", &[View, Add, Print]);
        cashier = some(cashier, "customers", &[View, Add]);

        let mut storekeeper = some(PermissionSet::new(), "dashboard", &[View]);
        for module in [
            "inventory_products",
            "inventory_stockIn",
            "inventory_stockOut",
            "inventory_stocktake",
        ] {
            storekeeper = all(storekeeper, module);
        }
        storekeeper = some(storekeeper, "inventory_transfers", &[View, Add, Print]);
        storekeeper = some(storekeeper, "purchase_invoices", &[View]);

        let mut hr_manager = some(PermissionSet::new(), "dashboard", &[View]);
        for module in ["hr_employees", "hr_attendance", "hr_payroll"] {
            hr_manager = all(hr_manager, module);
        }
        hr_manager = some(hr_manager, "reports", &[View, Export]);

        [
            ("admin", admin),
            ("accountant", accountant),
            ("cashier", cashier),
            ("storekeeper", storekeeper),
            ("hr_manager", hr_manager),
        ]
        .into_iter()
        .filter_map(|(name, set)| RoleName::parse(name).ok().map(|role| (role, set)))
        .fold(Self::new(), |catalog, (role, set)| catalog.with_role(role, set))
    }
}
