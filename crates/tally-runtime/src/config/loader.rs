//! Configuration loader with hierarchical merging.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Global config (`~/.tally/config.toml`)
//! 3. Project config (`<project>/.tally/config.toml`)
//! 4. Environment variables (`TALLY_*`)
//!
//! Each layer overrides the previous. Command-line flags are applied by
//! the binary on top of the loaded result.

use super::{
    default_config_path, ConfigError, ConfigLayer, TallyConfig, PROJECT_CONFIG_DIR,
    PROJECT_CONFIG_FILE,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```no_run
/// use tally_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_project_root("/path/to/project")
///     .skip_env_vars()
///     .load()?;
/// # Ok::<(), tally_runtime::config::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Global config file path (defaults to ~/.tally/config.toml).
    global_config_path: Option<PathBuf>,

    /// Project root directory.
    project_root: Option<PathBuf>,

    /// Skip environment variable loading.
    skip_env: bool,

    /// Skip global config loading.
    skip_global: bool,

    /// Skip project config loading.
    skip_project: bool,
}

impl ConfigLoader {
    /// Creates a new loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom global config path.
    #[must_use]
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Sets the project root directory.
    ///
    /// Project config will be loaded from `<project_root>/.tally/config.toml`.
    #[must_use]
    pub fn with_project_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_root = Some(path.into());
        self
    }

    /// Skips environment variable loading.
    ///
    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Skips global config loading.
    #[must_use]
    pub fn skip_global_config(mut self) -> Self {
        self.skip_global = true;
        self
    }

    /// Skips project config loading.
    #[must_use]
    pub fn skip_project_config(mut self) -> Self {
        self.skip_project = true;
        self
    }

    /// Loads and merges configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any config file exists but cannot be parsed,
    /// or an environment variable holds an invalid value.
    /// Missing config files are silently ignored.
    pub fn load(&self) -> Result<TallyConfig, ConfigError> {
        self.load_with_env(|name| std::env::var(name).ok())
    }

    fn load_with_env(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<TallyConfig, ConfigError> {
        let mut config = TallyConfig::default();

        // Layer 1: Global config
        if !self.skip_global {
            let global_path = self
                .global_config_path
                .clone()
                .unwrap_or_else(default_config_path);

            if let Some(global_config) = load_file(&global_path)? {
                debug!(path = %global_path.display(), "Loaded global config");
                config.merge(&global_config);
            }
        }

        // Layer 2: Project config
        if !self.skip_project {
            if let Some(ref project_root) = self.project_root {
                let project_config_path = project_root
                    .join(PROJECT_CONFIG_DIR)
                    .join(PROJECT_CONFIG_FILE);

                if let Some(project_config) = load_file(&project_config_path)? {
                    debug!(
                        path = %project_config_path.display(),
                        project = %project_root.display(),
                        "Loaded project config"
                    );
                    config.merge(&project_config);
                }
            }
        }

        // Layer 3: Environment variables
        if !self.skip_env {
            apply_env_vars(&mut config, env)?;
        }

        Ok(config)
    }
}

/// Loads a config file, returning None if it doesn't exist.
fn load_file(path: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
    let layer = ConfigLayer::from_toml(&content).map_err(|e| ConfigError::parse_toml(path, e))?;

    Ok(Some(layer))
}

/// Applies environment variable overrides.
fn apply_env_vars(
    config: &mut TallyConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(val) = env("TALLY_DEBUG") {
        config.debug = parse_bool(&val)
            .ok_or_else(|| ConfigError::invalid_env_var("TALLY_DEBUG", "expected bool"))?;
    }
    if let Some(val) = env("TALLY_DATA_PATH") {
        config.data.path = Some(PathBuf::from(val));
    }
    if let Some(val) = env("TALLY_COUNTER_START") {
        config.counter.start_from = parse_number("TALLY_COUNTER_START", &val)?;
    }
    if let Some(val) = env("TALLY_COUNTER_MAX_ATTEMPTS") {
        config.counter.max_attempts = parse_number("TALLY_COUNTER_MAX_ATTEMPTS", &val)?;
    }
    if let Some(val) = env("TALLY_PRIVILEGED_ROLES") {
        config.auth.privileged_roles = val
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();
    }
    Ok(())
}

/// Parses a boolean from string.
///
/// Accepts: "true", "false", "1", "0", "yes", "no", "on", "off" (case-insensitive).
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid_env_var(name, "expected integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn load_defaults_only() {
        let config = ConfigLoader::new()
            .skip_global_config()
            .skip_project_config()
            .skip_env_vars()
            .load()
            .unwrap();

        assert_eq!(config, TallyConfig::default());
    }

    #[test]
    fn load_project_overrides_global() {
        let global_temp = TempDir::new().unwrap();
        let project_temp = TempDir::new().unwrap();

        let tally_dir = project_temp.path().join(".tally");
        std::fs::create_dir_all(&tally_dir).unwrap();

        let global_path = create_config_file(
            global_temp.path(),
            r#"
debug = true

[counter]
start_from = 1
max_attempts = 10
"#,
        );
        create_config_file(
            &tally_dir,
            r#"
[counter]
start_from = 5000

[auth]
seed_default_roles = false
"#,
        );

        let config = ConfigLoader::new()
            .with_global_config(&global_path)
            .with_project_root(project_temp.path())
            .skip_env_vars()
            .load()
            .unwrap();

        // from global (not overridden in project)
        assert!(config.debug);
        assert_eq!(config.counter.max_attempts, 10);
        // from project
        assert_eq!(config.counter.start_from, 5000);
        assert!(!config.auth.seed_default_roles);
    }

    #[test]
    fn project_can_reset_global_to_defaults() {
        let global_temp = TempDir::new().unwrap();
        let project_temp = TempDir::new().unwrap();

        let tally_dir = project_temp.path().join(".tally");
        std::fs::create_dir_all(&tally_dir).unwrap();

        let global_path = create_config_file(
            global_temp.path(),
            r#"
[counter]
start_from = 1

[auth]
seed_default_roles = false
"#,
        );
        create_config_file(
            &tally_dir,
            r#"
[counter]
start_from = 1000

[auth]
seed_default_roles = true
privileged_roles = []
"#,
        );

        let config = ConfigLoader::new()
            .with_global_config(&global_path)
            .with_project_root(project_temp.path())
            .skip_env_vars()
            .load()
            .unwrap();

        assert_eq!(config.counter.start_from, 1000);
        assert!(config.auth.seed_default_roles);
        assert!(config.auth.privileged_roles.is_empty());
    }

    #[test]
    fn missing_config_files_ok() {
        let config = ConfigLoader::new()
            .with_global_config("/nonexistent/path/config.toml")
            .with_project_root("/nonexistent/project")
            .skip_env_vars()
            .load()
            .unwrap();

        assert_eq!(config, TallyConfig::default());
    }

    #[test]
    fn invalid_toml_is_error() {
        let temp = TempDir::new().unwrap();
        let path = create_config_file(temp.path(), "[counter\nstart_from = ");

        let result = ConfigLoader::new()
            .with_global_config(&path)
            .skip_env_vars()
            .load();
        assert!(matches!(result, Err(ConfigError::ParseToml { .. })));
    }

    #[test]
    fn env_var_override() {
        let env = env_of(&[
            ("TALLY_DEBUG", "yes"),
            ("TALLY_DATA_PATH", "/srv/data.json"),
            ("TALLY_COUNTER_START", "1"),
            ("TALLY_COUNTER_MAX_ATTEMPTS", "3"),
            ("TALLY_PRIVILEGED_ROLES", "owner, admin,"),
        ]);

        let config = ConfigLoader::new()
            .skip_global_config()
            .skip_project_config()
            .load_with_env(env)
            .unwrap();

        assert!(config.debug);
        assert_eq!(config.data.path, Some(PathBuf::from("/srv/data.json")));
        assert_eq!(config.counter.start_from, 1);
        assert_eq!(config.counter.max_attempts, 3);
        assert_eq!(config.auth.privileged_roles, ["owner", "admin"]);
    }

    #[test]
    fn empty_privileged_env_disables_bypass() {
        let config = ConfigLoader::new()
            .skip_global_config()
            .skip_project_config()
            .load_with_env(env_of(&[("TALLY_PRIVILEGED_ROLES", "")]))
            .unwrap();
        assert!(config.auth.privileged_roles.is_empty());
    }

    #[test]
    fn invalid_env_values() {
        for (name, value) in [
            ("TALLY_DEBUG", "maybe"),
            ("TALLY_COUNTER_START", "ten"),
            ("TALLY_COUNTER_MAX_ATTEMPTS", "-1"),
        ] {
            let result = ConfigLoader::new()
                .skip_global_config()
                .skip_project_config()
                .load_with_env(env_of(&[(name, value)]));
            assert!(
                matches!(result, Err(ConfigError::InvalidEnvVar { name: ref n, .. }) if n == name),
                "{name}={value}"
            );
        }
    }

    #[test]
    fn parse_bool_values() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("on"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("invalid"), None);
    }
}
