//! Tracing subscriber setup for binaries embedding the execution core.

use crate::error::{Result, VeilError};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,veil=debug";

/// Install the global tracing subscriber.
///
/// Honours `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
///
/// # Errors
/// Returns error if a global subscriber has already been installed.
pub fn init_tracing() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .map_err(|e| VeilError::Logging(e.to_string()))
}
