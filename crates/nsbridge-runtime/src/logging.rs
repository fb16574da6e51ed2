//! Diagnostic output
//!
//! The library only emits `tracing` events. Applications that have no
//! subscriber of their own can install a plain formatter here.

use nsbridge_config::loader::DEFAULT_LOG_LEVEL;
use nsbridge_config::BridgeConfig;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a formatting subscriber filtered by `filter`
///
/// Returns `false` when a global subscriber was already set; calling this
/// more than once is harmless. An unparsable filter falls back to the
/// default level.
pub fn init(filter: &str) -> bool {
    let (env_filter, rejected) = match EnvFilter::try_new(filter) {
        Ok(f) => (f, None),
        Err(e) => (EnvFilter::new(DEFAULT_LOG_LEVEL), Some(e)),
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok();

    if let Some(e) = rejected {
        warn!(filter, "invalid log filter, using '{}': {}", DEFAULT_LOG_LEVEL, e);
    }
    installed
}

/// Install a subscriber at the configured log level
pub fn init_from_config(config: &BridgeConfig) -> bool {
    init(&config.log_level)
}
