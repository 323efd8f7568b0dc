//! Error types for the core layer.
//!
//! Each crate in Lapse defines its own error enum. A `ConfigError` always
//! means the configuration itself is unusable, never that a session
//! misbehaved at runtime.

use std::time::Duration;

/// Errors produced while loading or validating a [`SessionConfig`](crate::SessionConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A duration that must be strictly positive was zero.
    #[error("{field} must be greater than zero")]
    NonPositive {
        /// The config key, in its serialized (camelCase) spelling.
        field: &'static str,
    },

    /// The warning would appear at or before the moment the session starts.
    ///
    /// `warningLeadMs` must be strictly less than `sessionTimeoutMs`,
    /// otherwise the warning timer would be scheduled for a non-positive
    /// delay and the prompt would open immediately.
    #[error("warningLeadMs ({lead:?}) must be less than sessionTimeoutMs ({timeout:?})")]
    WarningLeadTooLong {
        /// Configured warning lead.
        lead: Duration,
        /// Configured session timeout.
        timeout: Duration,
    },

    /// An event-name set was empty, so the monitor would never fire.
    #[error("{field} must name at least one event")]
    NoEvents {
        /// The config key, in its serialized (camelCase) spelling.
        field: &'static str,
    },

    /// The JSON document could not be parsed into a config.
    #[cfg(feature = "json")]
    #[error("config parse failed: {0}")]
    Parse(serde_json::Error),

    /// The config file could not be read.
    #[error("config file unreadable: {0}")]
    Io(#[from] std::io::Error),
}
