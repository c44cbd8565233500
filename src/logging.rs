//! Logging initialization: tracing to stderr with an env-filter.

use tracing_subscriber::EnvFilter;

use crate::core::errors::{GlowdError, Result};

/// Install the global tracing subscriber. Level defaults to `info` and can
/// be overridden via `RUST_LOG`.
pub fn init() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|err| GlowdError::Runtime {
        details: format!("logging init: {err}"),
    })?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "glowd starting");
    Ok(())
}
