//! nsbridge Configuration System
//!
//! Decides which native backend the bridge talks to, where the native binding
//! library lives, which calendar time zone date conversions use, and how
//! verbose logging is.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.nsbridge/config.toml)
//! 2. Project config (./nsbridge.toml, found by walking up)
//! 3. Environment variables (NSBRIDGE_*)
//!
//! # Example
//!
//! ```no_run
//! use nsbridge_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("backend: {}", config.backend);
//! ```

pub mod global;
pub mod loader;
pub mod project;

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

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use global::GlobalConfig;
pub use loader::{BridgeConfig, ConfigLoader};
pub use project::{BackendKind, BackendSection, CalendarSection, LoggingSection, ProjectConfig};
