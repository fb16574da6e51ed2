//! Process-wide bridge runtime
//!
//! The bridge is usable once a [`ForeignRuntime`] has been installed, either
//! directly with [`install`] or from configuration with [`init_from_config`].
//! Installation happens at most once per process. Code that holds its own
//! runtime value can skip this module entirely; every bridge function takes
//! the runtime as an argument.

use crate::calendar::Calendar;
use crate::runtime::dylib::DylibRuntime;
use crate::runtime::memory::MemoryRuntime;
use crate::runtime::ForeignRuntime;
use crate::{BridgeError, BridgeResult};
use nsbridge_config::{BackendKind, BridgeConfig};
use std::sync::OnceLock;
use tracing::{debug, info};

static RUNTIME: OnceLock<Box<dyn ForeignRuntime>> = OnceLock::new();

/// Install `runtime` as the process-wide bridge runtime
pub fn install(runtime: Box<dyn ForeignRuntime>) -> BridgeResult<&'static dyn ForeignRuntime> {
    let backend = runtime.backend_name();
    RUNTIME
        .set(runtime)
        .map_err(|_| BridgeError::AlreadyInitialized)?;
    info!(backend, "bridge runtime installed");
    self::runtime()
}

/// Build the configured backend and install it
///
/// Fails with [`BridgeError::AlreadyInitialized`] before touching the
/// native library when a runtime is already installed.
pub fn init_from_config(config: &BridgeConfig) -> BridgeResult<&'static dyn ForeignRuntime> {
    if is_ready() {
        return Err(BridgeError::AlreadyInitialized);
    }
    install(backend_from_config(config)?)
}

/// Build the configured backend without installing it
pub fn backend_from_config(config: &BridgeConfig) -> BridgeResult<Box<dyn ForeignRuntime>> {
    debug!(backend = %config.backend, library = %config.library, "selecting bridge backend");
    Ok(match config.backend {
        BackendKind::Memory => Box::new(MemoryRuntime::new()),
        BackendKind::Native => {
            // SAFETY: the configured library is the notification binding,
            // whose exports match the signatures DylibRuntime binds.
            let native = unsafe { DylibRuntime::load(&config.library, &config.search_paths)? };
            Box::new(native)
        }
    })
}

pub fn is_ready() -> bool {
    RUNTIME.get().is_some()
}

/// The installed runtime
pub fn runtime() -> BridgeResult<&'static dyn ForeignRuntime> {
    RUNTIME
        .get()
        .map(|rt| rt.as_ref())
        .ok_or(BridgeError::NotReady)
}

/// Calendar named by the configured time zone
pub fn calendar_from_config(config: &BridgeConfig) -> BridgeResult<Calendar> {
    Calendar::from_name(&config.timezone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsbridge_config::loader::DEFAULT_LIBRARY;

    fn memory_config() -> BridgeConfig {
        BridgeConfig {
            backend: BackendKind::Memory,
            ..Default::default()
        }
    }

    #[test]
    fn test_memory_backend_from_config() {
        let backend = backend_from_config(&memory_config()).unwrap();
        assert_eq!(backend.backend_name(), "memory");
    }

    #[test]
    fn test_native_backend_needs_the_library() {
        let config = BridgeConfig {
            backend: BackendKind::Native,
            library: format!("{}_absent_for_tests", DEFAULT_LIBRARY),
            ..Default::default()
        };
        assert!(matches!(
            backend_from_config(&config),
            Err(BridgeError::Load(_))
        ));
    }

    #[test]
    fn test_calendar_from_config() {
        let mut config = memory_config();
        config.timezone = "Asia/Tokyo".to_string();
        assert_eq!(
            calendar_from_config(&config).unwrap(),
            Calendar::Zone(chrono_tz::Asia::Tokyo)
        );

        config.timezone = "system".to_string();
        assert!(calendar_from_config(&config).unwrap().is_system());

        config.timezone = "Mars/Olympus_Mons".to_string();
        assert!(matches!(
            calendar_from_config(&config),
            Err(BridgeError::InvalidTimezone(_))
        ));
    }
}
