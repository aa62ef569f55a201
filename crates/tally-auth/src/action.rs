//! Action vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An operation a role may perform on a module.
///
/// Stored permission data uses the lowercase names (`"view"`, `"add"`, ...).
/// Anything else found in stored data is not an `Action` and can never be
/// granted.
///
/// # Example
///
/// ```
/// use tally_auth::Action;
///
/// let action: Action = "print".parse().unwrap();
/// assert_eq!(action, Action::Print);
/// assert_eq!(action.as_str(), "print");
///
/// assert!("launch".parse::<Action>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Open a screen or read records.
    View,
    /// Create records.
    Add,
    /// Modify existing records.
    Edit,
    /// Delete records.
    Delete,
    /// Produce printable documents.
    Print,
    /// Export data (spreadsheets, reports).
    Export,
    /// Approve pending documents (transfers, returns).
    Approve,
}

impl Action {
    /// All actions, in declaration order.
    pub const ALL: [Self; 7] = [
        Self::View,
        Self::Add,
        Self::Edit,
        Self::Delete,
        Self::Print,
        Self::Export,
        Self::Approve,
    ];

    /// Returns the stored name of this action.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Add => "add",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Print => "print",
            Self::Export => "export",
            Self::Approve => "approve",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The string does not name a known [`Action`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action: '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAction(s.to_string()))
    }
}
