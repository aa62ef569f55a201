//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use super::{default_data_path, ConfigError};
use crate::counter::{DEFAULT_MAX_ATTEMPTS, DEFAULT_START_FROM};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tally_auth::{PrivilegedRoles, DEFAULT_PRIVILEGED_ROLES};
use tally_types::RoleName;

/// Main configuration structure.
///
/// This is the unified configuration after merging all layers. A single
/// config file is read as a [`ConfigLayer`], where every field is optional.
///
/// # Example
///
/// ```
/// use tally_runtime::config::TallyConfig;
///
/// let config = TallyConfig::from_toml("[counter]\nstart_from = 1").unwrap();
/// assert_eq!(config.counter.start_from, 1);
/// assert_eq!(config.counter.max_attempts, 64);
/// assert!(config.auth.seed_default_roles);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TallyConfig {
    /// Enable debug logging.
    pub debug: bool,

    /// Data file configuration.
    pub data: DataConfig,

    /// Counter allocation.
    pub counter: CounterConfig,

    /// Permission settings.
    pub auth: AuthConfig,
}

impl TallyConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Applies one file layer on top of this config.
    ///
    /// Every field the layer sets overrides the current value, including
    /// values equal to the defaults.
    pub fn merge(&mut self, layer: &ConfigLayer) {
        if let Some(debug) = layer.debug {
            self.debug = debug;
        }
        if layer.data.path.is_some() {
            self.data.path = layer.data.path.clone();
        }
        if let Some(start_from) = layer.counter.start_from {
            self.counter.start_from = start_from;
        }
        if let Some(max_attempts) = layer.counter.max_attempts {
            self.counter.max_attempts = max_attempts;
        }
        if let Some(roles) = &layer.auth.privileged_roles {
            self.auth.privileged_roles = roles.clone();
        }
        if let Some(seed) = layer.auth.seed_default_roles {
            self.auth.seed_default_roles = seed;
        }
    }
}

/// One config file as written: only the fields it sets are `Some`.
///
/// # Example
///
/// ```
/// use tally_runtime::config::{ConfigLayer, TallyConfig};
///
/// let mut config = TallyConfig::default();
/// config.counter.start_from = 1;
///
/// let layer = ConfigLayer::from_toml("[counter]\nstart_from = 1000").unwrap();
/// config.merge(&layer);
/// assert_eq!(config.counter.start_from, 1000);
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfigLayer {
    /// Enable debug logging.
    pub debug: Option<bool>,

    /// Data file configuration.
    pub data: DataConfig,

    /// Counter allocation.
    pub counter: CounterLayer,

    /// Permission settings.
    pub auth: AuthLayer,
}

impl ConfigLayer {
    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

/// `[counter]` section of a [`ConfigLayer`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CounterLayer {
    pub start_from: Option<i64>,
    pub max_attempts: Option<u32>,
}

/// `[auth]` section of a [`ConfigLayer`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuthLayer {
    pub privileged_roles: Option<Vec<String>>,
    pub seed_default_roles: Option<bool>,
}

/// Data file configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    /// Snapshot file of the datastore (defaults to `~/.tally/data.json`).
    pub path: Option<PathBuf>,
}

impl DataConfig {
    /// Returns the snapshot path with `~` expanded.
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .as_deref()
            .map(expand_tilde)
            .unwrap_or_else(default_data_path)
    }
}

/// Counter allocation configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CounterConfig {
    /// First value of a counter that does not exist yet.
    pub start_from: i64,

    /// Compare-and-set attempts before an allocation fails.
    pub max_attempts: u32,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            start_from: DEFAULT_START_FROM,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Permission configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AuthConfig {
    /// Roles that are allowed every action regardless of stored permissions.
    pub privileged_roles: Vec<String>,

    /// Store the default role catalog when the datastore has none.
    pub seed_default_roles: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            privileged_roles: DEFAULT_PRIVILEGED_ROLES.iter().map(|r| r.to_string()).collect(),
            seed_default_roles: true,
        }
    }
}

impl AuthConfig {
    /// Builds the privileged role set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRole`] for a name that is not a valid key.
    pub fn privileged(&self) -> Result<PrivilegedRoles, ConfigError> {
        self.privileged_roles
            .iter()
            .map(|role| {
                RoleName::parse(role.as_str()).map_err(|source| ConfigError::InvalidRole {
                    role: role.clone(),
                    source,
                })
            })
            .collect()
    }
}

/// Expands `~` to the user's home directory.
pub(crate) fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
