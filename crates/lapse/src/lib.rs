//! # Lapse
//!
//! Client-side session lifecycle for web-style applications.
//!
//! Lapse ends a signed-in session when the user goes idle, when the tab
//! stays hidden too long, or when the auth backend stops vouching for it.
//! Shortly before an idle expiry it shows a warning the user can answer
//! with "stay signed in". Hosts plug in an [`AuthBackend`], an
//! [`EventSource`] for page events and, optionally, their own prompt and
//! router.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lapse::prelude::*;
//!
//! // Implement AuthBackend for your auth service, then:
//! // let mut manager = LapseBuilder::new()
//! //     .config(SessionConfig::default())
//! //     .build(my_auth, Arc::new(ManualEventSource::new()))?;
//! // manager.initialize(SessionCallbacks::new().on_expired(|reason| {
//! //     println!("signed out: {reason}");
//! // }))?;
//! ```

mod builder;
mod error;
pub mod telemetry;

pub use builder::LapseBuilder;
pub use error::LapseError;
pub use telemetry::init_tracing;

pub use lapse_core::{
    ConfigError, EpochId, ExpiryReason, SessionConfig, SessionPhase, SourceEvent, Visibility,
};
pub use lapse_session::{
    ArtifactStore, AuthBackend, AuthError, JsonFileStore, MemoryStore, Navigator, Presenter,
    PromptActions, SessionCallbacks, SessionError, SessionInfo, SessionManager, SessionSnapshot,
    StoreError, TracingNavigator, TracingPresenter, WarningPrompt,
};
pub use lapse_signals::{EventSource, Listener, ManualEventSource};

/// Everything a host typically needs, in one import.
pub mod prelude {
    pub use std::sync::Arc;

    pub use crate::{
        AuthBackend, AuthError, EventSource, ExpiryReason, LapseBuilder, LapseError,
        ManualEventSource, Navigator, Presenter, SessionCallbacks, SessionConfig, SessionInfo,
        SessionManager, SessionPhase, SourceEvent, Visibility, WarningPrompt,
    };
}
