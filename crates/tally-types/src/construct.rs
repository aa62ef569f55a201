//! Fallible construction.
//!
//! Types whose values become datastore path segments cannot be built from an
//! arbitrary string: the string has to be checked first. Those types
//! implement [`TryNew`] instead of exposing a plain `new()`.
//!
//! | Pattern | Use When |
//! |---------|----------|
//! | `new()` | Construction always succeeds |
//! | [`TryNew`] | Construction validates its input |
//! | `TryFrom<T>` | Converting from another domain type |

/// Trait for fallible construction with validation.
///
/// Types implementing `TryNew` do not also offer a `new()` that performs the
/// same validation; the `try_` prefix keeps fallibility visible at the call
/// site.
///
/// # Example
///
/// ```
/// use tally_types::{RoleName, TryNew};
///
/// let cashier = RoleName::try_new("cashier".to_string());
/// assert!(cashier.is_ok());
///
/// let broken = RoleName::try_new("".to_string());
/// assert!(broken.is_err());
/// ```
pub trait TryNew {
    /// Error returned when validation fails.
    type Error;

    /// Arguments required for construction (a tuple for several values).
    type Args;

    /// Attempts to create a new instance.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if validation fails.
    fn try_new(args: Self::Args) -> Result<Self, Self::Error>
    where
        Self: Sized;
}
