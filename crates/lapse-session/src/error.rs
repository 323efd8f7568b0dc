//! Error types for the session layer.

use std::time::Duration;

use lapse_core::{ConfigError, EpochId};

/// Errors returned by [`SessionManager`](crate::SessionManager) operations.
///
/// None of these ever reach the end user; a session that cannot be
/// validated is expired, not reported.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The config was rejected before any epoch started.
    #[error("invalid session config: {0}")]
    Config(#[from] ConfigError),

    /// `initialize` was called while an epoch is still live.
    /// Call `destroy` first (or wait for the session to expire).
    #[error("session manager already initialized ({0} is live)")]
    AlreadyInitialized(EpochId),

    /// An operation needed a live epoch but `initialize` was never called
    /// (or `destroy` already ran).
    #[error("session manager not initialized")]
    NotInitialized,

    /// The epoch's task has stopped and no longer answers.
    #[error("epoch {0} is unavailable")]
    Unavailable(EpochId),
}

/// Errors reported by an [`AuthBackend`](crate::AuthBackend).
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    /// The backend could not be reached or answered garbage.
    #[error("auth transport failed: {0}")]
    Transport(String),

    /// The backend refused the request (revoked token, etc.).
    #[error("auth rejected: {0}")]
    Rejected(String),

    /// The backend did not answer within `authTimeoutMs`.
    #[error("auth call timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors from an [`ArtifactStore`](crate::ArtifactStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("artifact store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
