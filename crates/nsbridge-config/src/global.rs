//! Global Configuration (~/.nsbridge/config.toml)
//!
//! Handles user-level defaults stored in `~/.nsbridge/config.toml`.

use crate::project::{validate_log_level, validate_timezone};
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.nsbridge/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// User-wide defaults, overridden by project configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Default native library name or path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,

    /// Library directories appended after the project's own search paths
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_paths: Vec<PathBuf>,

    /// Default time zone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    /// Default logging filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(defaults) = &self.defaults {
            if let Some(tz) = &defaults.timezone {
                validate_timezone("defaults.timezone", tz)?;
            }
            if let Some(level) = &defaults.log_level {
                validate_log_level("defaults.log_level", level)?;
            }
        }
        Ok(())
    }

    /// Get the global config file path (~/.nsbridge/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".nsbridge").join("config.toml"))
    }

    pub fn default_library(&self) -> Option<&str> {
        self.defaults.as_ref().and_then(|d| d.library.as_deref())
    }

    pub fn default_timezone(&self) -> Option<&str> {
        self.defaults.as_ref().and_then(|d| d.timezone.as_deref())
    }

    pub fn default_log_level(&self) -> Option<&str> {
        self.defaults.as_ref().and_then(|d| d.log_level.as_deref())
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        self.defaults
            .as_ref()
            .map(|d| d.search_paths.as_slice())
            .unwrap_or(&[])
    }
}
