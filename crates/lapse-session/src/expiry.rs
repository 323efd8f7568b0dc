//! Ending a session.
//!
//! Expiry has a synchronous half and an asynchronous half. The epoch
//! actor does the synchronous half itself (phase, timers, prompt,
//! listeners) so nothing can fire in between. The slow half lives here:
//! sign out on the backend, forget the persisted artifact, then hand
//! control to the host.

use std::sync::Arc;
use std::time::Duration;

use lapse_core::{EpochId, ExpiryReason, SessionConfig};
use tracing::{debug, info, warn};

use crate::auth::AuthBackend;
use crate::presenter::Navigator;
use crate::state::ExpiredCallback;
use crate::store::ArtifactStore;

/// Owns what the teardown needs. Hands it out exactly once per epoch.
pub(crate) struct ExpiryHandler<A: AuthBackend> {
    auth: Arc<A>,
    store: Arc<dyn ArtifactStore>,
    navigator: Arc<dyn Navigator>,
    storage_key: String,
    login_route: String,
    auth_timeout: Duration,
    on_expired: Option<ExpiredCallback>,
}

impl<A: AuthBackend> ExpiryHandler<A> {
    pub(crate) fn new(
        config: &SessionConfig,
        auth: Arc<A>,
        store: Arc<dyn ArtifactStore>,
        navigator: Arc<dyn Navigator>,
        on_expired: Option<ExpiredCallback>,
    ) -> Self {
        Self {
            auth,
            store,
            navigator,
            storage_key: config.storage_key.clone(),
            login_route: config.login_route.clone(),
            auth_timeout: config.auth_timeout,
            on_expired,
        }
    }

    /// Build the teardown for `reason`. The expired callback moves into
    /// the first teardown built; later ones fall back to navigation.
    pub(crate) fn teardown(&mut self, epoch: EpochId, reason: ExpiryReason) -> Teardown<A> {
        Teardown {
            epoch,
            reason,
            auth: Arc::clone(&self.auth),
            store: Arc::clone(&self.store),
            navigator: Arc::clone(&self.navigator),
            storage_key: self.storage_key.clone(),
            login_route: self.login_route.clone(),
            auth_timeout: self.auth_timeout,
            on_expired: self.on_expired.take(),
        }
    }
}

/// The asynchronous half of one expiry.
pub(crate) struct Teardown<A: AuthBackend> {
    epoch: EpochId,
    reason: ExpiryReason,
    auth: Arc<A>,
    store: Arc<dyn ArtifactStore>,
    navigator: Arc<dyn Navigator>,
    storage_key: String,
    login_route: String,
    auth_timeout: Duration,
    on_expired: Option<ExpiredCallback>,
}

impl<A: AuthBackend> Teardown<A> {
    /// Sign out, clear the artifact, then notify the host.
    ///
    /// Each step is best-effort: a failure is logged and the next step
    /// still runs, so the host always gets control back.
    pub(crate) async fn run(self) {
        let epoch = self.epoch;

        match tokio::time::timeout(self.auth_timeout, self.auth.sign_out()).await {
            Ok(Ok(())) => debug!(%epoch, "signed out"),
            Ok(Err(e)) => warn!(%epoch, error = %e, "sign-out failed; continuing teardown"),
            Err(_) => warn!(
                %epoch,
                timeout_ms = self.auth_timeout.as_millis() as u64,
                "sign-out timed out; continuing teardown"
            ),
        }

        match self.store.remove(&self.storage_key) {
            Ok(removed) => debug!(%epoch, key = %self.storage_key, removed, "session artifact cleared"),
            Err(e) => warn!(%epoch, key = %self.storage_key, error = %e, "failed to clear session artifact"),
        }

        match self.on_expired {
            Some(on_expired) => on_expired(self.reason),
            None => {
                info!(%epoch, route = %self.login_route, "no expiry callback; navigating to login");
                self.navigator.navigate(&self.login_route);
            }
        }
    }
}
