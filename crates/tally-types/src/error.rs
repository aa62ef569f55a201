//! Unified error code interface.
//!
//! Every error enum in tally implements [`ErrorCode`], so callers can branch
//! on a stable machine-readable code and decide whether retrying makes
//! sense without matching on crate-specific variants.
//!
//! | Prefix | Domain |
//! |--------|--------|
//! | `KEY_` | Identifier validation |
//! | `STORE_` | Datastore writes and reads |
//! | `SUBSCRIPTION_` | Live collection subscriptions |
//! | `COUNTER_` | Counter allocation |
//! | `AUTH_` | Authorization |
//! | `IDENTITY_` | Session token resolution |
//! | `GENERATION_` | Text generation |

/// Machine-readable error code plus retry hint.
///
/// Codes are UPPER_SNAKE_CASE, prefixed by domain, and stable once
/// published.
///
/// # Example
///
/// ```
/// use tally_types::ErrorCode;
///
/// enum PaymentError {
///     Declined,
///     GatewayTimeout,
/// }
///
/// impl ErrorCode for PaymentError {
///     fn code(&self) -> &'static str {
///         match self {
///             Self::Declined => "PAYMENT_DECLINED",
///             Self::GatewayTimeout => "PAYMENT_GATEWAY_TIMEOUT",
///         }
///     }
///
///     fn is_recoverable(&self) -> bool {
///         matches!(self, Self::GatewayTimeout)
///     }
/// }
///
/// assert!(PaymentError::GatewayTimeout.is_recoverable());
/// assert_eq!(PaymentError::Declined.code(), "PAYMENT_DECLINED");
/// ```
pub trait ErrorCode {
    /// Returns the machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns `true` if retrying the operation may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error code is non-empty, UPPER_SNAKE_CASE and carries the
/// expected prefix.
///
/// # Panics
///
/// Panics with a descriptive message if any check fails.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{code}' must start with prefix '{expected_prefix}'"
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{code}' must be UPPER_SNAKE_CASE"
    );
}

/// Asserts [`assert_error_code`] for every error in the slice.
///
/// Use it to cover all variants of an error enum in one test.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum LedgerError {
        Locked,
        Unbalanced,
    }

    impl ErrorCode for LedgerError {
        fn code(&self) -> &'static str {
            match self {
                Self::Locked => "LEDGER_LOCKED",
                Self::Unbalanced => "LEDGER_UNBALANCED",
            }
        }

        fn is_recoverable(&self) -> bool {
            matches!(self, Self::Locked)
        }
    }

    #[test]
    fn codes_and_recoverability() {
        assert_eq!(LedgerError::Locked.code(), "LEDGER_LOCKED");
        assert!(LedgerError::Locked.is_recoverable());
        assert!(!LedgerError::Unbalanced.is_recoverable());
    }

    #[test]
    fn all_variants_follow_convention() {
        assert_error_codes(&[LedgerError::Locked, LedgerError::Unbalanced], "LEDGER_");
    }

    #[test]
    #[should_panic(expected = "must start with prefix")]
    fn wrong_prefix_panics() {
        assert_error_code(&LedgerError::Locked, "STORE_");
    }

    #[test]
    fn upper_snake_case_detection() {
        assert!(is_upper_snake_case("STORE_NOT_FOUND"));
        assert!(is_upper_snake_case("E2"));

        assert!(!is_upper_snake_case(""));
        assert!(!is_upper_snake_case("store_not_found"));
        assert!(!is_upper_snake_case("_STORE"));
        assert!(!is_upper_snake_case("STORE_"));
        assert!(!is_upper_snake_case("STORE__X"));
    }
}
