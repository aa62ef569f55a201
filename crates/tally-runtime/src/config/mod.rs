//! Configuration management with hierarchical layering.
//!
//! # Architecture
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌──────────────────────────────────────────┐
//! │  1. Command-line flags (tally binary)    │  Per invocation
//! ├──────────────────────────────────────────┤
//! │  2. Environment Variables (TALLY_*)      │  Runtime override
//! ├──────────────────────────────────────────┤
//! │  3. Project Config (.tally/config.toml)  │  Project-specific
//! ├──────────────────────────────────────────┤
//! │  4. Global Config (~/.tally/config.toml) │  User defaults
//! ├──────────────────────────────────────────┤
//! │  5. Default Values (compile-time)        │  Fallback
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `TALLY_DEBUG` | `debug` | bool |
//! | `TALLY_DATA_PATH` | `data.path` | PathBuf |
//! | `TALLY_COUNTER_START` | `counter.start_from` | i64 |
//! | `TALLY_COUNTER_MAX_ATTEMPTS` | `counter.max_attempts` | u32 |
//! | `TALLY_PRIVILEGED_ROLES` | `auth.privileged_roles` | comma-separated |
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.tally/config.toml
//! debug = false
//!
//! [data]
//! path = "~/.tally/data.json"
//!
//! [counter]
//! start_from = 1000
//! max_attempts = 64
//!
//! [auth]
//! privileged_roles = ["admin", "مسؤول"]
//! seed_default_roles = true
//! ```

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{
    AuthConfig, AuthLayer, ConfigLayer, CounterConfig, CounterLayer, DataConfig, TallyConfig,
};

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".tally")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Default datastore snapshot path.
pub fn default_data_path() -> std::path::PathBuf {
    default_config_dir().join("data.json")
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".tally";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
