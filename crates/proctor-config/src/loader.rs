//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::settings::{PartialConfig, ProctorConfig};
use crate::ConfigResult;
use std::env;
use std::path::{Path, PathBuf};

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = "proctor.toml";

/// Environment variable holding a JSON object of global options
pub const GLOBAL_OPTS_VAR: &str = "PROCTOR_GLOBAL_OPTS";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Defaults - lowest priority
/// 2. Project file (proctor.toml) - overrides defaults
/// 3. PROCTOR_GLOBAL_OPTS JSON - overrides the project file
/// 4. Individual PROCTOR_* variables - overrides the JSON options
/// 5. Engine builder calls - highest priority (handled by caller)
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Skip the environment layers entirely
    ignore_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { ignore_env: false }
    }

    /// Do not read any environment variables
    pub fn without_env(mut self) -> Self {
        self.ignore_env = true;
        self
    }

    /// Load configuration from defaults and the environment only
    pub fn load(&self) -> ConfigResult<ProctorConfig> {
        self.resolve(None)
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find proctor.toml, then applies
    /// the environment layers on top of it.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<ProctorConfig> {
        let file_layer = match Self::find_config_file(start_dir) {
            Some(path) => Some(PartialConfig::load_from_file(&path)?),
            None => None,
        };
        self.resolve(file_layer)
    }

    /// Load configuration from a specific config file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<ProctorConfig> {
        let file_layer = PartialConfig::load_from_file(config_path)?;
        self.resolve(Some(file_layer))
    }

    /// Find the nearest proctor.toml by walking up the directory tree
    pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Some(config_path);
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return None,
            }
        }
    }

    fn resolve(&self, file_layer: Option<PartialConfig>) -> ConfigResult<ProctorConfig> {
        let mut merged = file_layer.unwrap_or_default();

        if !self.ignore_env {
            if let Some(json) = Self::global_opts_layer()? {
                merged.merge(&json);
            }
            merged.merge(&Self::env_layer()?);
        }

        merged.validate()?;

        let mut config = ProctorConfig::default();
        config.apply(&merged);
        Ok(config)
    }

    /// Parse PROCTOR_GLOBAL_OPTS, if set and non-empty
    fn global_opts_layer() -> ConfigResult<Option<PartialConfig>> {
        match env::var(GLOBAL_OPTS_VAR) {
            Ok(json) if !json.trim().is_empty() => {
                PartialConfig::from_json_str(&json, GLOBAL_OPTS_VAR).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Collect the individual environment variable overrides
    ///
    /// Variables follow the pattern PROCTOR_<KEY>, e.g. PROCTOR_SYNC_MODE=async
    fn env_layer() -> ConfigResult<PartialConfig> {
        let mut layer = PartialConfig::default();

        if let Ok(output) = env::var("PROCTOR_OUTPUT") {
            layer.output = Some(output.parse()?);
        }

        if let Ok(mode) = env::var("PROCTOR_SYNC_MODE") {
            layer.sync_mode = Some(mode.parse()?);
        }

        if let Ok(timeout) = env::var("PROCTOR_TIMEOUT_MS") {
            let millis = timeout
                .trim()
                .parse::<u64>()
                .map_err(|e| crate::ConfigError::InvalidValue {
                    field: "timeout_ms".to_string(),
                    reason: format!("'{}' is not a number of milliseconds: {}", timeout, e),
                })?;
            layer.timeout_ms = Some(millis);
        }

        if env::var("PROCTOR_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok() {
            layer.no_color = Some(true);
        }

        if let Ok(global_run) = env::var("PROCTOR_GLOBAL_RUN") {
            layer.global_run = Some(is_truthy(&global_run));
        }

        Ok(layer)
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{ExecutionMode, OutputStyle};
    use crate::ConfigError;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    fn clear_env() {
        for var in [
            GLOBAL_OPTS_VAR,
            "PROCTOR_OUTPUT",
            "PROCTOR_SYNC_MODE",
            "PROCTOR_TIMEOUT_MS",
            "PROCTOR_NO_COLOR",
            "NO_COLOR",
            "PROCTOR_GLOBAL_RUN",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "output = \"plain\"\n");

        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();

        let found = ConfigLoader::find_config_file(&sub_dir).unwrap();
        assert_eq!(found, temp_dir.path().join(CONFIG_FILE_NAME));

        let config = ConfigLoader::new()
            .without_env()
            .load_from_directory(&sub_dir)
            .unwrap();
        assert_eq!(config.output, OutputStyle::Plain);
    }

    #[test]
    fn test_load_from_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigLoader::new()
            .without_env()
            .load_from_file(&temp_dir.path().join(CONFIG_FILE_NAME));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    #[serial]
    fn test_global_opts_override_file() {
        clear_env();
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "output = \"plain\"\nsync_mode = \"sync\"\n");

        env::set_var(GLOBAL_OPTS_VAR, r#"{ "console_output_type": "json" }"#);

        let config = ConfigLoader::new()
            .load_from_directory(temp_dir.path())
            .unwrap();
        assert_eq!(config.output, OutputStyle::Json);
        assert_eq!(config.sync_mode, Some(ExecutionMode::Sync));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_var_overrides_global_opts() {
        clear_env();
        env::set_var(GLOBAL_OPTS_VAR, r#"{ "sync_type": "sync", "timeout_ms": 10 }"#);
        env::set_var("PROCTOR_SYNC_MODE", "ASYNC");

        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.sync_mode, Some(ExecutionMode::Async));
        assert_eq!(config.timeout_ms, Some(10));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_global_opts_with_legacy_console_key() {
        clear_env();
        env::set_var(
            GLOBAL_OPTS_VAR,
            r#"{ "console_output_type": "plain", "disable_console_output": false }"#,
        );

        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config.output, OutputStyle::Plain);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_flags() {
        clear_env();
        env::set_var("NO_COLOR", "1");
        env::set_var("PROCTOR_GLOBAL_RUN", "yes");

        let config = ConfigLoader::new().load().unwrap();
        assert!(config.no_color);
        assert!(config.global_run);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_timeout_env() {
        clear_env();
        env::set_var("PROCTOR_TIMEOUT_MS", "soon");

        let result = ConfigLoader::new().load();
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_without_env_ignores_variables() {
        clear_env();
        env::set_var("PROCTOR_OUTPUT", "json");

        let config = ConfigLoader::new().without_env().load().unwrap();
        assert_eq!(config.output, OutputStyle::Dot);

        clear_env();
    }
}
