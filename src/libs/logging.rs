use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::libs::error::{Error, Result};

/// Install a global `fmt` subscriber. `RUST_LOG` takes precedence over `level`.
///
/// Fails with [`Error::Configuration`] when a global subscriber is already set.
pub fn init_logging(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| Error::Configuration {
            message: format!("logging already initialized: {}", e),
        })
}
