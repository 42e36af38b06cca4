//! Tracing subscriber setup

use tracing_subscriber::{fmt, EnvFilter};

use super::ServerConfig;

/// Installs the global subscriber once.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this a
/// second time is a no-op.
pub fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&server.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let result = if server.log_json {
        fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(true)
            .try_init()
    } else {
        fmt().with_env_filter(filter).with_target(true).try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
