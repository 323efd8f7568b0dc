//! Unified error type for Lapse.

use lapse_core::ConfigError;
use lapse_session::{SessionError, StoreError};

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `lapse` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant generates the `From` impls, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum LapseError {
    /// The config could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A session manager operation failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The artifact store could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The tracing subscriber could not be installed.
    #[error("telemetry setup failed: {0}")]
    Telemetry(String),
}
