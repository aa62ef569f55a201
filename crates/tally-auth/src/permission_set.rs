//! Per-role permission sets.

use crate::Action;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Module → action → allowed mapping for one role.
///
/// Stored data is read leniently: a non-boolean action value becomes
/// `false`, a non-object module entry becomes a module with no actions.
/// Lookups are total and default to deny at every level.
///
/// # Example
///
/// ```
/// use tally_auth::{Action, PermissionSet};
/// use serde_json::json;
///
/// let set = PermissionSet::from_value(&json!({
///     "sales_invoices": { "view": true, "add": true, "delete": "yes" }
/// }));
///
/// assert!(set.allows("sales_invoices", "add"));
/// assert!(!set.allows("sales_invoices", "delete")); // non-boolean
/// assert!(!set.allows("unknown_module", "view"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionSet {
    modules: BTreeMap<String, BTreeMap<String, bool>>,
}

impl PermissionSet {
    /// Creates an empty set (denies everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a set from stored JSON.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(modules) = value.as_object() else {
            return Self::default();
        };

        let modules = modules
            .iter()
            .map(|(module, actions)| {
                let actions = actions
                    .as_object()
                    .map(|actions| {
                        actions
                            .iter()
                            .map(|(action, allowed)| {
                                (action.clone(), allowed.as_bool().unwrap_or(false))
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                (module.clone(), actions)
            })
            .collect();

        Self { modules }
    }

    /// Converts the set back to its stored JSON form.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let modules: Map<String, Value> = self
            .modules
            .iter()
            .map(|(module, actions)| {
                let actions: Map<String, Value> = actions
                    .iter()
                    .map(|(action, allowed)| (action.clone(), Value::Bool(*allowed)))
                    .collect();
                (module.clone(), Value::Object(actions))
            })
            .collect();
        Value::Object(modules)
    }

    /// Sets the stored flag for `action` on `module`.
    pub fn set(&mut self, module: &str, action: Action, allowed: bool) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(action.as_str().to_string(), allowed);
    }

    /// Grants `actions` on `module`.
    #[must_use]
    pub fn grant(mut self, module: &str, actions: &[Action]) -> Self {
        for action in actions {
            self.set(module, *action, true);
        }
        self
    }

    /// Returns `true` if the module entry exists (whatever its actions).
    #[must_use]
    pub fn has_module(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// Returns the stored flag, `None` if module or action is absent.
    #[must_use]
    pub fn stored(&self, module: &str, action: &str) -> Option<bool> {
        self.modules.get(module)?.get(action).copied()
    }

    /// Returns `true` only if the stored flag is present and `true`.
    #[must_use]
    pub fn allows(&self, module: &str, action: &str) -> bool {
        self.stored(module, action).unwrap_or(false)
    }

    /// Returns module names in sorted order.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Returns `true` if no module entry exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lenient_read_of_malformed_data() {
        let set = PermissionSet::from_value(&json!({
            "reports": { "view": 1, "print": null, "export": true },
            "dashboard": "all",
        }));

        assert!(!set.allows("reports", "view"));
        assert!(!set.allows("reports", "print"));
        assert!(set.allows("reports", "export"));

        assert!(set.has_module("dashboard"));
        assert!(!set.allows("dashboard", "view"));
    }

    #[test]
    fn non_object_root_is_empty() {
        assert!(PermissionSet::from_value(&json!(true)).is_empty());
        assert!(PermissionSet::from_value(&Value::Null).is_empty());
    }

    #[test]
    fn stored_distinguishes_absent_and_false() {
        let mut set = PermissionSet::new();
        set.set("customers", Action::Delete, false);

        assert_eq!(set.stored("customers", "delete"), Some(false));
        assert_eq!(set.stored("customers", "view"), None);
        assert_eq!(set.stored("suppliers", "view"), None);
    }

    #[test]
    fn value_round_trip_keeps_flags() {
        let set = PermissionSet::new()
            .grant("sales_pos", &[Action::View, Action::Add])
            .grant("cash_receipts", &[Action::Print]);

        let restored = PermissionSet::from_value(&set.to_value());
        assert_eq!(restored, set);
    }

    #[test]
    fn deserialize_is_lenient() {
        let set: PermissionSet =
            serde_json::from_value(json!({ "hr_employees": { "view": "true" } }))
                .expect("lenient deserialize");
        assert!(!set.allows("hr_employees", "view"));
    }
}
