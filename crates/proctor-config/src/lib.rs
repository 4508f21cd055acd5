//! Proctor Configuration
//!
//! Resolves the settings that control a test run:
//! - Output style (dot, plain, json)
//! - Global execution-mode override for every test file
//! - Per-invocation timeout
//! - Color and "already run" switches
//!
//! # Configuration Hierarchy
//!
//! Sources are merged in the following order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Project file (`proctor.toml`, searched upwards from a start directory)
//! 3. `PROCTOR_GLOBAL_OPTS` (a JSON object)
//! 4. Individual environment variables (`PROCTOR_*`, `NO_COLOR`)
//! 5. Builder calls on the engine
//!
//! # Example
//!
//! ```no_run
//! use proctor_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("output style: {}", config.output);
//! ```

pub mod loader;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid JSON in {var}: {error}")]
    JsonParseError {
        var: String,
        error: serde_json::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use loader::ConfigLoader;
pub use settings::{ExecutionMode, OutputStyle, PartialConfig, ProctorConfig};
