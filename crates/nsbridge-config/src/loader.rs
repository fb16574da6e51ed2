//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{validate_log_level, validate_timezone, BackendKind, ProjectConfig};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// File name looked up while walking towards the filesystem root
pub const PROJECT_CONFIG_FILE: &str = "nsbridge.toml";

/// Library exported by the native notification binding
pub const DEFAULT_LIBRARY: &str = "JMacNotification";

/// Use the host's own calendar time zone
pub const SYSTEM_TIMEZONE: &str = "system";

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.nsbridge/config.toml) - lowest priority
/// 2. Project config (./nsbridge.toml) - overrides global
/// 3. Environment variables (NSBRIDGE_*) - overrides project
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Effective configuration after merging every source
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub backend: BackendKind,

    /// Library name or absolute path handed to the library loader
    pub library: String,

    /// Project search paths first, then the user's
    pub search_paths: Vec<PathBuf>,

    /// IANA zone name or [`SYSTEM_TIMEZONE`]
    pub timezone: String,

    pub log_level: String,

    /// Directory where nsbridge.toml was found
    pub project_root: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::platform_default(),
            library: DEFAULT_LIBRARY.to_string(),
            search_paths: Vec::new(),
            timezone: SYSTEM_TIMEZONE.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            project_root: None,
        }
    }
}

impl BridgeConfig {
    /// Check if this came from a project (has nsbridge.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    pub fn uses_system_timezone(&self) -> bool {
        self.timezone.eq_ignore_ascii_case(SYSTEM_TIMEZONE)
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Read user defaults from `path` instead of ~/.nsbridge/config.toml
    pub fn with_global_config_path(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find nsbridge.toml, then merges the
    /// global config and environment overrides.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<BridgeConfig> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;
        let global_config = self.load_global_config()?;

        let merged = merge(&global_config, &project_config, project_root);
        apply_env_overrides(merged)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<BridgeConfig> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = self.load_global_config()?;

        let project_root = config_path.parent().map(|p| p.to_path_buf());
        let merged = merge(&global_config, &project_config, project_root);
        apply_env_overrides(merged)
    }

    /// Find project configuration by walking up directory tree
    ///
    /// Returns (project_root, project_config); defaults when nothing is found
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration; a missing file or home directory means defaults
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        if self.global_config_path.is_none() {
            match GlobalConfig::global_config_path() {
                Ok(path) => self.global_config_path = Some(path),
                Err(ConfigError::HomeNotFound) => return Ok(GlobalConfig::default()),
                Err(e) => return Err(e),
            }
        }

        match &self.global_config_path {
            Some(path) if path.exists() => GlobalConfig::load_from_file(path),
            _ => Ok(GlobalConfig::default()),
        }
    }

    /// Get the global configuration directory (~/.nsbridge)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".nsbridge"))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn merge(
    global: &GlobalConfig,
    project: &ProjectConfig,
    project_root: Option<PathBuf>,
) -> BridgeConfig {
    let defaults = BridgeConfig::default();

    let mut search_paths = project.search_paths().to_vec();
    search_paths.extend(global.search_paths().iter().cloned());

    BridgeConfig {
        backend: project.backend_kind().unwrap_or(defaults.backend),
        library: project
            .library()
            .or_else(|| global.default_library())
            .map(str::to_string)
            .unwrap_or(defaults.library),
        search_paths,
        timezone: project
            .timezone()
            .or_else(|| global.default_timezone())
            .map(str::to_string)
            .unwrap_or(defaults.timezone),
        log_level: project
            .log_level()
            .or_else(|| global.default_log_level())
            .map(str::to_string)
            .unwrap_or(defaults.log_level),
        project_root,
    }
}

/// Apply environment variable overrides
///
/// NSBRIDGE_BACKEND, NSBRIDGE_LIBRARY, NSBRIDGE_TIMEZONE, NSBRIDGE_LOG
fn apply_env_overrides(mut config: BridgeConfig) -> ConfigResult<BridgeConfig> {
    if let Ok(backend) = env::var("NSBRIDGE_BACKEND") {
        config.backend = backend.parse()?;
    }

    if let Ok(library) = env::var("NSBRIDGE_LIBRARY") {
        if library.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "NSBRIDGE_LIBRARY".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        config.library = library;
    }

    if let Ok(timezone) = env::var("NSBRIDGE_TIMEZONE") {
        validate_timezone("NSBRIDGE_TIMEZONE", &timezone)?;
        config.timezone = timezone;
    }

    if let Ok(level) = env::var("NSBRIDGE_LOG") {
        validate_log_level("NSBRIDGE_LOG", &level)?;
        config.log_level = level;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::global::DefaultsConfig;
    use crate::project::{BackendSection, CalendarSection};
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    fn isolated_loader(dir: &TempDir) -> ConfigLoader {
        ConfigLoader::with_global_config_path(dir.path().join("no-global.toml"))
    }

    #[test]
    fn test_project_overrides_global() {
        let global = GlobalConfig {
            defaults: Some(DefaultsConfig {
                library: Some("GlobalLib".to_string()),
                timezone: Some("UTC".to_string()),
                search_paths: vec![PathBuf::from("/global")],
                ..Default::default()
            }),
        };
        let project = ProjectConfig {
            backend: Some(BackendSection {
                kind: Some(BackendKind::Memory),
                library: None,
                search_paths: vec![PathBuf::from("/project")],
            }),
            calendar: Some(CalendarSection {
                timezone: Some("Asia/Tokyo".to_string()),
            }),
            logging: None,
        };

        let merged = merge(&global, &project, None);
        assert_eq!(merged.backend, BackendKind::Memory);
        assert_eq!(merged.library, "GlobalLib");
        assert_eq!(merged.timezone, "Asia/Tokyo");
        assert_eq!(merged.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(
            merged.search_paths,
            vec![PathBuf::from("/project"), PathBuf::from("/global")]
        );
    }

    #[test]
    #[serial]
    fn test_env_override_backend() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[backend]\nkind = \"native\"\n");

        env::set_var("NSBRIDGE_BACKEND", "memory");
        let result = isolated_loader(&temp_dir).load_from_directory(temp_dir.path());
        env::remove_var("NSBRIDGE_BACKEND");

        assert_eq!(result.unwrap().backend, BackendKind::Memory);
    }

    #[test]
    #[serial]
    fn test_env_override_rejects_bad_backend() {
        let temp_dir = TempDir::new().unwrap();

        env::set_var("NSBRIDGE_BACKEND", "quartz");
        let result = isolated_loader(&temp_dir).load_from_directory(temp_dir.path());
        env::remove_var("NSBRIDGE_BACKEND");

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_defaults_without_any_file() {
        let config = BridgeConfig::default();
        assert_eq!(config.library, DEFAULT_LIBRARY);
        assert!(config.uses_system_timezone());
        assert!(!config.is_project());
    }
}
