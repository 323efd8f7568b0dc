//! Shared vocabulary for Lapse.
//!
//! This crate defines the types every other layer speaks:
//!
//! - **Types** ([`SessionPhase`], [`SourceEvent`], [`ExpiryReason`], etc.):
//!   the states and signals that flow through the session lifecycle.
//! - **Config** ([`SessionConfig`]): the timeouts and event names that
//!   govern one session manager, validated up front.
//! - **Errors** ([`ConfigError`]): what can be wrong with a config.
//!
//! # Architecture
//!
//! The core layer knows nothing about timers, listeners or the auth
//! backend. It only describes them:
//!
//! ```text
//! Signals (events) → Timer (deadlines) → Session (state machine)
//!            ↖──────── Core (types, config) ────────↗
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod config;
mod error;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use config::SessionConfig;
pub use error::ConfigError;
pub use types::{EpochId, ExpiryReason, SessionPhase, SourceEvent, Visibility};
