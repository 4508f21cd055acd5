//! Run settings
//!
//! `PartialConfig` is one layer of configuration as it appears in a single
//! source (`proctor.toml`, `PROCTOR_GLOBAL_OPTS`, ...). `ProctorConfig` is
//! the resolved result after all layers have been applied.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// How the tests of one file are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ExecutionMode {
    /// Each test decides through its own `async` option
    #[default]
    Default,
    /// Every test runs one at a time
    Sync,
    /// Every test starts together and completes in any order
    Async,
}

impl FromStr for ExecutionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(ExecutionMode::Default),
            "sync" => Ok(ExecutionMode::Sync),
            "async" => Ok(ExecutionMode::Async),
            other => Err(ConfigError::InvalidValue {
                field: "sync_mode".to_string(),
                reason: format!("must be 'default', 'sync', or 'async', got '{}'", other),
            }),
        }
    }
}

impl TryFrom<String> for ExecutionMode {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ExecutionMode> for String {
    fn from(mode: ExecutionMode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Default => write!(f, "default"),
            ExecutionMode::Sync => write!(f, "sync"),
            ExecutionMode::Async => write!(f, "async"),
        }
    }
}

/// Console report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputStyle {
    /// One symbol per test while running, details for failures at the end
    #[default]
    Dot,
    /// Full details for every non-passing test as soon as it finishes
    Plain,
    /// Nothing while running, a JSON document at the end
    Json,
}

impl FromStr for OutputStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dot" => Ok(OutputStyle::Dot),
            "plain" => Ok(OutputStyle::Plain),
            "json" => Ok(OutputStyle::Json),
            other => Err(ConfigError::InvalidValue {
                field: "output".to_string(),
                reason: format!("must be 'dot', 'plain', or 'json', got '{}'", other),
            }),
        }
    }
}

impl TryFrom<String> for OutputStyle {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputStyle> for String {
    fn from(style: OutputStyle) -> Self {
        style.to_string()
    }
}

impl fmt::Display for OutputStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStyle::Dot => write!(f, "dot"),
            OutputStyle::Plain => write!(f, "plain"),
            OutputStyle::Json => write!(f, "json"),
        }
    }
}

/// Global-options keys that carry no setting here
///
/// Console capture and result publishing are not supported; objects written
/// with these keys still load.
pub const IGNORED_LEGACY_KEYS: &[&str] = &[
    "disable_console_output",
    "test_result_url",
    "test_run_id",
    "test_run_name",
    "test_run_env",
    "test_run_project",
];

/// One layer of configuration; every field is optional
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    /// Report format
    #[serde(default, alias = "console_output_type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputStyle>,

    /// Execution mode forced onto every file
    #[serde(default, alias = "sync_type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_mode: Option<ExecutionMode>,

    /// Disable colored output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_color: Option<bool>,

    /// Timeout for each hook and test body, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Treat the run as already performed by another invocation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_run: Option<bool>,
}

impl PartialConfig {
    /// Parse a TOML layer
    pub fn from_toml_str(content: &str, file: &Path) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            file: file.to_path_buf(),
            error: e,
        })
    }

    /// Parse a JSON layer read from the environment variable `var`
    ///
    /// Keys in [`IGNORED_LEGACY_KEYS`] are accepted and discarded; any other
    /// unknown key is an error.
    pub fn from_json_str(content: &str, var: &str) -> ConfigResult<Self> {
        let parse_error = |error| ConfigError::JsonParseError {
            var: var.to_string(),
            error,
        };

        let mut value: serde_json::Value = serde_json::from_str(content).map_err(parse_error)?;
        if let Some(object) = value.as_object_mut() {
            for key in IGNORED_LEGACY_KEYS {
                object.remove(*key);
            }
        }

        serde_json::from_value(value).map_err(parse_error)
    }

    /// Load a TOML layer from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        Self::from_toml_str(&content, path)
    }

    /// Merge another layer into this one
    /// Other layer takes precedence for non-None values
    pub fn merge(&mut self, other: &PartialConfig) {
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.sync_mode.is_some() {
            self.sync_mode = other.sync_mode;
        }
        if other.no_color.is_some() {
            self.no_color = other.no_color;
        }
        if other.timeout_ms.is_some() {
            self.timeout_ms = other.timeout_ms;
        }
        if other.global_run.is_some() {
            self.global_run = other.global_run;
        }
    }

    /// Validate field values that the type system cannot rule out
    pub fn validate(&self) -> ConfigResult<()> {
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Fully resolved run configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProctorConfig {
    /// Report format (default: dot)
    pub output: OutputStyle,
    /// Execution mode forced onto every file, if any
    pub sync_mode: Option<ExecutionMode>,
    /// Disable colored output
    pub no_color: bool,
    /// Timeout for each hook and test body, in milliseconds
    pub timeout_ms: Option<u64>,
    /// Skip `run` entirely, another invocation owns the run
    pub global_run: bool,
}

impl ProctorConfig {
    /// Apply a layer on top of this configuration
    pub fn apply(&mut self, layer: &PartialConfig) {
        if let Some(output) = layer.output {
            self.output = output;
        }
        if layer.sync_mode.is_some() {
            self.sync_mode = layer.sync_mode;
        }
        if let Some(no_color) = layer.no_color {
            self.no_color = no_color;
        }
        if layer.timeout_ms.is_some() {
            self.timeout_ms = layer.timeout_ms;
        }
        if let Some(global_run) = layer.global_run {
            self.global_run = global_run;
        }
    }

    /// Per-invocation timeout as a `Duration`
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
