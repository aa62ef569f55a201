//! The static Module/Action catalog.
//!
//! The catalog declares, for every module, which actions exist at all.
//! It is the outermost default-deny layer: an action the catalog does not
//! declare for a module is refused even when stored permission data says
//! `true`.

use crate::Action;
use std::collections::{BTreeMap, BTreeSet};

/// Registry of modules and the actions each one supports.
///
/// Built once at startup and shared read-only.
///
/// # Example
///
/// ```
/// use tally_auth::{Action, ModuleCatalog};
///
/// let catalog = ModuleCatalog::retail();
/// assert!(catalog.declares("inventory_stockIn", Action::Print));
/// assert!(!catalog.declares("inventory_stockIn", Action::Edit));
/// assert!(!catalog.declares("no_such_module", Action::View));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleCatalog {
    modules: BTreeMap<String, BTreeSet<Action>>,
}

/// Modules of the retail back-office and their action vocabulary.
const RETAIL_MODULES: &[(&str, &[Action])] = {
    use Action::{Add, Approve, Delete, Edit, Export, Print, View};
    &[
        ("dashboard", &[View]),
        ("inventory_products", &[View, Add, Edit, Delete, Print, Export]),
        ("inventory_stockIn", &[View, Add, Delete, Print]),
        ("inventory_stockOut", &[View, Add, Delete, Print]),
        ("inventory_transfers", &[View, Add, Approve, Print]),
        ("inventory_stocktake", &[View, Add, Edit, Export]),
        ("sales_invoices", &[View, Add, Edit, Delete, Print]),
        ("sales_returns", &[View, Add, Approve, Print]),
        ("sales_pos", &[View, Add, Print]),
        ("purchase_invoices", &[View, Add, Edit, Delete, Print]),
        ("purchase_returns", &[View, Add, Approve, Print]),
        ("customers", &[View, Add, Edit, Delete, Export]),
        ("suppliers", &[View, Add, Edit, Delete, Export]),
        ("cash_accounts", &[View, Add, Edit]),
        ("cash_receipts", &[View, Add, Delete, Print]),
        ("cash_payments", &[View, Add, Delete, Print]),
        ("hr_employees", &[View, Add, Edit, Delete]),
        ("hr_attendance", &[View, Add, Edit]),
        ("hr_payroll", &[View, Add, Approve, Print, Export]),
        ("reports", &[View, Print, Export]),
        ("ai_analysis", &[View]),
        ("ai_invoiceExtraction", &[View, Add]),
        ("settings_branches", &[View, Add, Edit, Delete]),
        ("settings_users", &[View, Add, Edit, Delete]),
        ("settings_roles", &[View, Edit]),
    ]
};

impl ModuleCatalog {
    /// Creates an empty catalog (every check denies).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the catalog of the retail back-office.
    #[must_use]
    pub fn retail() -> Self {
        let mut catalog = Self::new();
        for (module, actions) in RETAIL_MODULES {
            catalog.declare(module, actions.iter().copied());
        }
        catalog
    }

    /// Declares `actions` for `module`, extending any earlier declaration.
    pub fn declare(&mut self, module: &str, actions: impl IntoIterator<Item = Action>) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .extend(actions);
    }

    /// Builder-style variant of [`declare`](Self::declare).
    #[must_use]
    pub fn with_module(mut self, module: &str, actions: &[Action]) -> Self {
        self.declare(module, actions.iter().copied());
        self
    }

    /// Returns `true` if `module` exists and declares `action`.
    #[must_use]
    pub fn declares(&self, module: &str, action: Action) -> bool {
        self.modules
            .get(module)
            .is_some_and(|actions| actions.contains(&action))
    }

    /// Returns the actions declared for `module`.
    pub fn actions(&self, module: &str) -> impl Iterator<Item = Action> + '_ {
        self.modules
            .get(module)
            .into_iter()
            .flat_map(|actions| actions.iter().copied())
    }

    /// Returns all module names in sorted order.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Returns the number of declared modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if no module is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
