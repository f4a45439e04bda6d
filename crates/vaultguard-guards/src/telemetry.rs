//! Tracing subscriber setup for hosts embedding the guards.
//!
//! The library itself only emits `tracing` events. Hosts that want them on
//! stdout call [`init_tracing`] once at startup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use vaultguard_types::{GuardError, LoggingConfig, Result};

/// Install a global subscriber: `RUST_LOG` if set, otherwise `config.level`,
/// with human-readable or JSON-lines output.
///
/// # Errors
/// Returns [`GuardError::Configuration`] if the filter directive does not
/// parse or a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| GuardError::Configuration(format!("invalid log filter: {e}")))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    installed.map_err(|e| GuardError::Configuration(format!("tracing already initialized: {e}")))
}
