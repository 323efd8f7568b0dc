//! UI seams: the warning prompt and the login redirect.
//!
//! The session layer never draws anything. It asks a [`Presenter`] to put
//! a prompt on screen and a [`Navigator`] to leave for the login page, so
//! the same state machine can drive a browser modal, a terminal line or a
//! headless test double.

use std::fmt;
use std::time::Duration;

use lapse_core::EpochId;
use tokio::sync::mpsc;

use crate::epoch::EpochCommand;

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// The user's two choices on the warning prompt.
///
/// Cheap to clone. Safe to use after the prompt was hidden or the epoch
/// ended; the call is then a no-op that returns `false`.
#[derive(Clone)]
pub struct PromptActions {
    epoch: EpochId,
    commands: mpsc::WeakUnboundedSender<EpochCommand>,
}

impl PromptActions {
    pub(crate) fn new(epoch: EpochId, commands: mpsc::WeakUnboundedSender<EpochCommand>) -> Self {
        Self { epoch, commands }
    }

    /// "Stay signed in": hide the prompt and restart the full window.
    pub fn extend(&self) -> bool {
        self.send(EpochCommand::Extend)
    }

    /// "Log out now": hide the prompt and end the session.
    pub fn logout_now(&self) -> bool {
        self.send(EpochCommand::PromptLogout)
    }

    fn send(&self, command: EpochCommand) -> bool {
        match self.commands.upgrade() {
            Some(tx) => tx.send(command).is_ok(),
            None => {
                tracing::debug!(epoch = %self.epoch, "prompt action after epoch ended");
                false
            }
        }
    }
}

impl fmt::Debug for PromptActions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromptActions")
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

/// Everything a presenter needs to render the "session expiring" prompt.
#[derive(Debug, Clone)]
pub struct WarningPrompt {
    pub epoch: EpochId,
    /// Time left before the session expires, as of showing the prompt.
    pub expires_in: Duration,
    pub actions: PromptActions,
}

/// Shows and hides the single "session expiring" prompt.
///
/// The session layer guarantees `show` is never called twice without a
/// `hide` in between, and `hide` is only called while a prompt is shown.
pub trait Presenter: Send + Sync + 'static {
    fn show(&self, prompt: WarningPrompt);
    fn hide(&self);
}

/// Leaves the application for the login surface.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, route: &str);
}

// ---------------------------------------------------------------------------
// Stock implementations
// ---------------------------------------------------------------------------

/// Presenter for hosts without a UI: logs the prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn show(&self, prompt: WarningPrompt) {
        tracing::warn!(
            epoch = %prompt.epoch,
            expires_in_secs = prompt.expires_in.as_secs(),
            "session expiring soon"
        );
    }

    fn hide(&self) {
        tracing::debug!("session warning dismissed");
    }
}

/// Navigator for hosts without a router: logs the redirect.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        tracing::info!(route, "redirecting to login");
    }
}
