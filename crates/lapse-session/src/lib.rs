//! Session lifecycle management for Lapse.
//!
//! This crate decides when a signed-in user's session ends:
//!
//! 1. **Inactivity**: no interaction for the session timeout
//! 2. **Tab hidden**: the tab stayed in the background past its grace window
//! 3. **Backend checks**: the auth service says the session is gone (or
//!    can't be reached)
//! 4. **Logout**: the host or the user asked for it
//!
//! Shortly before an inactivity expiry the user is warned and can extend.
//!
//! # How it fits in the stack
//!
//! ```text
//! Host app (above)  ← builds a SessionManager, renders the prompt
//!     ↕
//! Session Layer (this crate)  ← one actor task per epoch
//!     ↕
//! Signals + Timers (below)  ← EventSource listeners, TimerScheduler
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod epoch;
mod error;
mod expiry;
mod manager;
mod presenter;
mod state;
mod store;
mod validator;
mod warning;

pub use auth::{AuthBackend, SessionInfo};
pub use error::{AuthError, SessionError, StoreError};
pub use manager::SessionManager;
pub use presenter::{
    Navigator, Presenter, PromptActions, TracingNavigator, TracingPresenter, WarningPrompt,
};
pub use state::{
    ClockState, ExpiredCallback, SessionCallbacks, SessionSnapshot, TabReturn, WarningCallback,
};
pub use store::{ArtifactStore, JsonFileStore, MemoryStore};
pub use validator::{CheckOutcome, SessionValidator};

pub use lapse_core::{EpochId, ExpiryReason, SessionConfig, SessionPhase};
