//! Logging setup via `tracing-subscriber`.
//!
//! `RUST_LOG` takes precedence over the configured default level. With
//! `json: true`, log lines are emitted as JSON objects for production
//! ingestion; text format otherwise.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingSettings;

/// Initializes the global tracing subscriber.
///
/// Call once at startup. Repeated calls are no-ops (the subscriber is
/// global), which keeps test setups simple.
pub fn init_logging(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.clone()));

    if settings.json {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init();
    }
}
