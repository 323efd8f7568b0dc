//! Tracing setup for hosts that don't install their own subscriber.

use tracing_subscriber::EnvFilter;

use crate::LapseError;

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"lapse=info"`) when it is unset.
///
/// # Errors
/// Returns [`LapseError::Telemetry`] if the directive doesn't parse or a
/// global subscriber is already installed.
pub fn init_tracing(default_directive: &str) -> Result<(), LapseError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|e| LapseError::Telemetry(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| LapseError::Telemetry(e.to_string()))
}
