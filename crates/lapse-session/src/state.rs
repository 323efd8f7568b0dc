//! Session state: the clock fields, callbacks and snapshots.
//!
//! `ClockState` holds when the user last did something and whether (and
//! since when) the tab is hidden. Only the epoch actor mutates it.

use std::fmt;
use std::time::Duration;

use lapse_core::{EpochId, ExpiryReason, SessionPhase};
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// ClockState
// ---------------------------------------------------------------------------

/// Activity and visibility timestamps for one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockState {
    /// Last activity (or reset) instant.
    pub last_activity_at: Instant,
    /// When the tab went hidden; `None` while visible.
    pub last_tab_hidden_at: Option<Instant>,
    pub tab_visible: bool,
}

/// What a "tab visible" signal turned out to mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabReturn {
    /// The tab was not hidden; the signal is plain presence.
    WasVisible,
    /// Back before the grace window ran out.
    WithinGrace { away: Duration },
    /// The grace window elapsed while hidden. The tab stays marked hidden;
    /// the caller is expected to end the session.
    GraceElapsed { away: Duration },
}

impl ClockState {
    /// A fresh epoch: active now, tab visible.
    pub fn new(now: Instant) -> Self {
        Self {
            last_activity_at: now,
            last_tab_hidden_at: None,
            tab_visible: true,
        }
    }

    pub fn record_activity(&mut self, now: Instant) {
        self.last_activity_at = now;
    }

    /// Time since the last activity.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity_at)
    }

    /// `max(0, timeout - idle)`.
    pub fn time_until_expiry(&self, now: Instant, timeout: Duration) -> Duration {
        timeout.saturating_sub(self.idle_for(now))
    }

    /// How long the tab has been hidden, or `None` while visible.
    pub fn hidden_for(&self, now: Instant) -> Option<Duration> {
        if self.tab_visible {
            return None;
        }
        self.last_tab_hidden_at
            .map(|since| now.saturating_duration_since(since))
    }

    /// Mark the tab hidden. Returns `false` if it already was; the
    /// original hide instant is kept so repeated signals (`blur` followed
    /// by `visibilitychange`) can't stretch the grace window.
    pub fn mark_hidden(&mut self, now: Instant) -> bool {
        if !self.tab_visible {
            return false;
        }
        self.tab_visible = false;
        self.last_tab_hidden_at = Some(now);
        true
    }

    /// Mark the tab visible, unless it was away longer than `grace`.
    pub fn mark_visible(&mut self, now: Instant, grace: Duration) -> TabReturn {
        let Some(since) = self.last_tab_hidden_at else {
            self.tab_visible = true;
            return TabReturn::WasVisible;
        };
        let away = now.saturating_duration_since(since);
        if away > grace {
            return TabReturn::GraceElapsed { away };
        }
        self.tab_visible = true;
        self.last_tab_hidden_at = None;
        TabReturn::WithinGrace { away }
    }
}

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

/// Called once when an epoch ends, with the reason it ended.
pub type ExpiredCallback = Box<dyn FnOnce(ExpiryReason) + Send>;

/// Called each time the warning prompt opens.
pub type WarningCallback = Box<dyn Fn() + Send>;

/// Hooks injected at `initialize`.
///
/// Without `on_expired`, expiry falls back to navigating to the configured
/// login route.
#[derive(Default)]
pub struct SessionCallbacks {
    pub(crate) on_expired: Option<ExpiredCallback>,
    pub(crate) on_warning: Option<WarningCallback>,
}

impl SessionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_expired(mut self, callback: impl FnOnce(ExpiryReason) + Send + 'static) -> Self {
        self.on_expired = Some(Box::new(callback));
        self
    }

    pub fn on_warning(mut self, callback: impl Fn() + Send + 'static) -> Self {
        self.on_warning = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for SessionCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCallbacks")
            .field("on_expired", &self.on_expired.is_some())
            .field("on_warning", &self.on_warning.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A point-in-time view of an epoch, answered by its actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub epoch: EpochId,
    pub phase: SessionPhase,
    pub time_until_expiry: Duration,
    /// `time_until_expiry <= warning_lead`.
    pub expiring_soon: bool,
    pub warning_shown: bool,
    pub tab_visible: bool,
    /// Timers with a live deadline (0–4).
    pub live_timers: usize,
    /// Every timer ever armed in this epoch.
    pub armed_total: u64,
}
