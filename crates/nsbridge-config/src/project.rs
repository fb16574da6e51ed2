//! Project Configuration (nsbridge.toml)
//!
//! Handles project-level configuration stored in `nsbridge.toml`.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Project configuration from nsbridge.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Native backend selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendSection>,

    /// Calendar used for date conversions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar: Option<CalendarSection>,

    /// Logging verbosity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingSection>,
}

/// Which object runtime the bridge talks to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process reference object runtime
    Memory,
    /// The native binding library loaded at runtime
    Native,
}

impl BackendKind {
    /// Native on macOS, where the binding library exists; memory elsewhere.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            BackendKind::Native
        } else {
            BackendKind::Memory
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::Native => "native",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "native" => Ok(BackendKind::Native),
            other => Err(ConfigError::InvalidValue {
                field: "backend.kind".to_string(),
                reason: format!("must be 'memory' or 'native', got '{}'", other),
            }),
        }
    }
}

/// `[backend]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BackendSection {
    /// Backend kind ("memory" or "native")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<BackendKind>,

    /// Native library name or absolute path (default: "JMacNotification")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,

    /// Extra directories searched before the system library paths
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_paths: Vec<PathBuf>,
}

/// `[calendar]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CalendarSection {
    /// IANA time zone name, or "system" for the host's zone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Filter directive, e.g. "info" or "nsbridge_runtime=trace"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl ProjectConfig {
    /// Load project configuration from a file
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

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(backend) = &self.backend {
            if let Some(library) = &backend.library {
                if library.trim().is_empty() {
                    return Err(ConfigError::ValidationError(
                        "backend.library cannot be empty".to_string(),
                    ));
                }
            }
        }

        if let Some(calendar) = &self.calendar {
            if let Some(tz) = &calendar.timezone {
                validate_timezone("calendar.timezone", tz)?;
            }
        }

        if let Some(logging) = &self.logging {
            if let Some(level) = &logging.level {
                validate_log_level("logging.level", level)?;
            }
        }

        Ok(())
    }

    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.backend.as_ref().and_then(|b| b.kind)
    }

    pub fn library(&self) -> Option<&str> {
        self.backend.as_ref().and_then(|b| b.library.as_deref())
    }

    pub fn timezone(&self) -> Option<&str> {
        self.calendar.as_ref().and_then(|c| c.timezone.as_deref())
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        self.backend
            .as_ref()
            .map(|b| b.search_paths.as_slice())
            .unwrap_or(&[])
    }
}

/// Zone names are checked against the tz database by the runtime; here we
/// only reject values that can never be a zone name.
pub(crate) fn validate_timezone(field: &str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() || value.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' is not a time zone name", value),
        });
    }
    Ok(())
}

pub(crate) fn validate_log_level(field: &str, value: &str) -> ConfigResult<()> {
    let plain = matches!(
        value.to_lowercase().as_str(),
        "off" | "error" | "warn" | "info" | "debug" | "trace"
    );
    // Per-target directives like "nsbridge_runtime=debug" are passed through.
    if plain || value.contains('=') {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!(
                "must be off, error, warn, info, debug, trace or a target directive, got '{}'",
                value
            ),
        })
    }
}
