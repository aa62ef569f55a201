//! Core types for tally.
//!
//! This crate provides the identifier types shared by every tally crate:
//! collection names, record identifiers, counter names, role names and
//! datastore paths. It also defines the [`ErrorCode`] convention used by
//! all error enums in the workspace.
//!
//! # Crate Architecture
//!
//! ```text
//! tally-types   : keys, paths, ErrorCode, TryNew   ◄── HERE
//!     ↑
//! tally-auth    : Module/Action catalog, RoleCatalog, PermissionEvaluator
//!     ↑
//! tally-runtime : Datastore, CollectionStore, CounterAllocator, config
//!     ↑
//! tally-cli     : `tally` binary
//! ```
//!
//! # Key Rules
//!
//! Every identifier that becomes a datastore path segment is validated at
//! construction time (see [`TryNew`]). A valid key is non-empty and contains
//! none of `/ . # $ [ ]` and no control characters, so it can never address
//! a different node than intended.
//!
//! # Example
//!
//! ```
//! use tally_types::{CollectionName, CounterName, DataPath, TryNew};
//!
//! let employees = CollectionName::try_new("employees".to_string()).unwrap();
//! assert_eq!(employees.as_str(), "employees");
//!
//! // Invalid keys are rejected up front
//! assert!(CollectionName::try_new("a/b".to_string()).is_err());
//!
//! let counter = CounterName::try_new("customerPayment".to_string()).unwrap();
//! assert_eq!(DataPath::counter(&counter).to_string(), "counters/customerPayment");
//! ```

mod construct;
mod error;
mod id;
mod key;
mod path;

pub use construct::TryNew;
pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{CollectionName, CounterName, RecordId, RoleName, UserId};
pub use key::{validate_collection_name, validate_key, KeyError};
pub use path::DataPath;

/// Root segment under which counters are stored.
pub const COUNTERS_ROOT: &str = "counters";

/// Root segment under which role permission sets are stored.
pub const ROLES_ROOT: &str = "roles";

/// Root segment under which user records are stored.
pub const USERS_ROOT: &str = "users";

/// Root segments owned by the runtime; no collection may use these names.
pub const RESERVED_ROOTS: &[&str] = &[COUNTERS_ROOT, ROLES_ROOT, USERS_ROOT];
