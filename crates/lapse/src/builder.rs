//! `LapseBuilder`: one place to wire a session manager together.

use std::path::PathBuf;
use std::sync::Arc;

use lapse_core::SessionConfig;
use lapse_session::{
    ArtifactStore, AuthBackend, MemoryStore, Navigator, Presenter, SessionManager,
    TracingNavigator, TracingPresenter,
};
use lapse_signals::EventSource;

use crate::LapseError;

/// Builder for a [`SessionManager`].
///
/// Anything not set falls back to a stock piece: the default config, a
/// presenter and navigator that only log, and an in-memory store.
///
/// # Example
///
/// ```rust,ignore
/// use lapse::prelude::*;
///
/// let mut manager = LapseBuilder::new()
///     .config_file("session.json")
///     .presenter(Arc::new(MyModal::new()))
///     .build(MyAuth::connect()?, Arc::new(ManualEventSource::new()))?;
/// manager.initialize(SessionCallbacks::new())?;
/// ```
#[derive(Default)]
pub struct LapseBuilder {
    config: Option<SessionConfig>,
    config_file: Option<PathBuf>,
    presenter: Option<Arc<dyn Presenter>>,
    navigator: Option<Arc<dyn Navigator>>,
    store: Option<Arc<dyn ArtifactStore>>,
}

impl LapseBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `config` as is.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load the config from a JSON file at build time. Takes precedence
    /// over [`config`](Self::config).
    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn presenter(mut self, presenter: Arc<dyn Presenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Resolve the config and build the manager. No epoch is started;
    /// call `initialize` on the result.
    ///
    /// # Errors
    /// - [`LapseError::Config`] if the config file can't be read, parsed
    ///   or validated.
    /// - [`LapseError::Session`] if an explicit config fails validation.
    pub fn build<A: AuthBackend>(
        self,
        auth: A,
        source: Arc<dyn EventSource>,
    ) -> Result<SessionManager<A>, LapseError> {
        let config = match (&self.config_file, self.config) {
            (Some(path), _) => {
                tracing::debug!(path = %path.display(), "loading session config");
                SessionConfig::from_json_file(path)?
            }
            (None, Some(config)) => config,
            (None, None) => SessionConfig::default(),
        };

        let manager = SessionManager::new(config, auth, source)?
            .with_presenter(self.presenter.unwrap_or_else(|| Arc::new(TracingPresenter)))
            .with_navigator(self.navigator.unwrap_or_else(|| Arc::new(TracingNavigator)))
            .with_store(self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())));

        tracing::info!(
            timeout_secs = manager.config().session_timeout.as_secs(),
            warning_lead_secs = manager.config().warning_lead.as_secs(),
            "session manager built"
        );
        Ok(manager)
    }
}
