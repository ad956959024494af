//! Structured logging infrastructure for tmesh.
//!
//! The scheduling engine only emits `tracing` events; installing a
//! subscriber is left to the embedding application, which can use one of
//! the initializers here.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system with human-readable output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level.
///
/// # Example
/// ```no_run
/// use tmesh_core::logging;
///
/// logging::init();
/// tracing::info!("Scheduler started");
/// ```
pub fn init() {
    tracing_subscriber::registry()
        .with(default_filter())
        .with(fmt::layer().with_target(true))
        .init();
}

/// Initialize the logging system with JSON output.
///
/// # Example
/// ```no_run
/// use tmesh_core::logging;
///
/// logging::init_json();
/// tracing::info!(community = "field", "Joined community");
/// ```
pub fn init_json() {
    tracing_subscriber::registry()
        .with(default_filter())
        .with(fmt::layer().json().with_target(true))
        .init();
}

/// Initialize whichever output format the configuration asks for.
pub fn init_with(config: &LoggingConfig) {
    if config.json {
        init_json();
    } else {
        init();
    }
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
