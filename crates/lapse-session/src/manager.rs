//! The session manager: the public face of the session layer.
//!
//! A host creates one `SessionManager` per signed-in user and calls
//! [`initialize`](SessionManager::initialize) once sign-in succeeds.
//! From then on the manager keeps one *epoch* running. An epoch is a
//! single Tokio task that watches activity, shows the warning, checks
//! the backend and eventually expires the session.
//!
//! # Concurrency note
//!
//! The manager itself is a plain struct. Methods that change which
//! epoch is current (`initialize`, `destroy`) take `&mut self`; the rest
//! take `&self` and only talk to the epoch over its channel. Hosts that
//! need to share it wrap it the usual way (`Arc<Mutex<_>>`).
//!
//! ## Lifecycle
//!
//! ```text
//!  new() ──→ initialize() ──→ [epoch E-1 running] ──(expires)──→ [E-1 Expired]
//!                 ▲                  │                                │
//!                 │              destroy()                            │
//!                 │                  ▼                                │
//!                 └──────────── [no epoch] ◀──────────────────────────┘
//!                                            (initialize() starts E-2)
//! ```

use std::sync::Arc;
use std::time::Duration;

use lapse_core::{EpochId, SessionConfig, SessionPhase};
use lapse_signals::EventSource;
use tracing::{debug, info};

use crate::auth::AuthBackend;
use crate::epoch::{EpochHandle, EpochParts, spawn_epoch};
use crate::error::SessionError;
use crate::presenter::{Navigator, Presenter, TracingNavigator, TracingPresenter};
use crate::state::{SessionCallbacks, SessionSnapshot};
use crate::store::{ArtifactStore, MemoryStore};

/// Owns the session lifecycle for one user.
///
/// Generic over the auth backend so production and tests can plug in
/// different ones without dynamic dispatch on the hot path.
pub struct SessionManager<A: AuthBackend> {
    /// Validated at construction and again at each `initialize`.
    config: Arc<SessionConfig>,
    auth: Arc<A>,
    source: Arc<dyn EventSource>,
    presenter: Arc<dyn Presenter>,
    navigator: Arc<dyn Navigator>,
    store: Arc<dyn ArtifactStore>,
    /// The current epoch, if any. May hold an expired epoch until the
    /// next `initialize` or `destroy` releases it.
    current: Option<EpochHandle>,
    /// Last epoch id handed out; ids are never reused.
    last_epoch: EpochId,
}

impl<A: AuthBackend> SessionManager<A> {
    /// Create a manager with the stock presenter, navigator and store.
    ///
    /// # Errors
    /// Returns [`SessionError::Config`] if `config` fails validation.
    pub fn new(
        config: SessionConfig,
        auth: A,
        source: Arc<dyn EventSource>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            source,
            presenter: Arc::new(TracingPresenter),
            navigator: Arc::new(TracingNavigator),
            store: Arc::new(MemoryStore::new()),
            current: None,
            last_epoch: EpochId(0),
        })
    }

    /// Use `presenter` for the warning prompt. Applies from the next epoch.
    pub fn with_presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = presenter;
        self
    }

    /// Use `navigator` for the login redirect. Applies from the next epoch.
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Use `store` for the persisted session artifact.
    pub fn with_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = store;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start a new epoch.
    ///
    /// Listeners are attached and timers armed before this returns.
    /// An expired epoch left over from before is released first.
    ///
    /// # Errors
    /// - [`SessionError::AlreadyInitialized`] if an epoch is still live;
    ///   call [`destroy`](Self::destroy) first.
    /// - [`SessionError::Config`] if the config no longer validates.
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn initialize(&mut self, callbacks: SessionCallbacks) -> Result<EpochId, SessionError> {
        self.config.validate()?;
        if let Some(handle) = &self.current {
            if handle.is_live() {
                return Err(SessionError::AlreadyInitialized(handle.epoch()));
            }
            debug!(epoch = %handle.epoch(), "releasing finished epoch");
        }
        self.current = None;

        let epoch = self.last_epoch.next();
        self.last_epoch = epoch;
        let handle = spawn_epoch(EpochParts {
            epoch,
            config: Arc::clone(&self.config),
            auth: Arc::clone(&self.auth),
            source: Arc::clone(&self.source),
            presenter: Arc::clone(&self.presenter),
            navigator: Arc::clone(&self.navigator),
            store: Arc::clone(&self.store),
            callbacks,
        });
        self.current = Some(handle);
        Ok(epoch)
    }

    /// Treat the user as present right now: dismiss the warning and
    /// restart the full window. Ignored once the session has expired.
    pub fn extend_session(&self) -> Result<(), SessionError> {
        self.handle()?.extend()
    }

    /// End the session now and wait for sign-out, artifact cleanup and
    /// the expired callback (or navigation) to finish.
    ///
    /// Resolves immediately if the session already expired; the teardown
    /// never runs twice.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.handle()?.logout().await
    }

    /// `max(0, session_timeout - idle time)`.
    pub async fn time_until_expiry(&self) -> Result<Duration, SessionError> {
        Ok(self.snapshot().await?.time_until_expiry)
    }

    /// `true` once the remaining time is within the warning lead.
    pub async fn is_session_expiring_soon(&self) -> Result<bool, SessionError> {
        Ok(self.snapshot().await?.expiring_soon)
    }

    /// Ask the current epoch for a snapshot of its state.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.handle()?.snapshot().await
    }

    /// Phase of the current epoch, without a round trip to its task.
    pub fn phase(&self) -> Option<SessionPhase> {
        self.current.as_ref().map(EpochHandle::phase)
    }

    /// Id of the current epoch, if any.
    pub fn epoch(&self) -> Option<EpochId> {
        self.current.as_ref().map(EpochHandle::epoch)
    }

    /// Stop the current epoch: cancel its timers, hide the prompt and
    /// detach its listeners. Does not sign out. Safe to call repeatedly.
    ///
    /// A teardown already started by an expiry keeps running.
    pub async fn destroy(&mut self) {
        let Some(handle) = self.current.take() else {
            debug!("destroy with no epoch");
            return;
        };
        let epoch = handle.epoch();
        match handle.shutdown().await {
            Ok(()) => info!(%epoch, "session manager destroyed"),
            // The task is already gone; its drop released everything.
            Err(e) => debug!(%epoch, error = %e, "epoch already stopped"),
        }
    }

    fn handle(&self) -> Result<&EpochHandle, SessionError> {
        self.current.as_ref().ok_or(SessionError::NotInitialized)
    }
}

impl<A: AuthBackend> std::fmt::Debug for SessionManager<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("epoch", &self.epoch())
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}
