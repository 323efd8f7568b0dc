//! Cancellable session deadlines for Lapse.
//!
//! A session runs four timers that must never be duplicated: the warning
//! timer, the expiry timer, the tab-hidden timer and the repeating
//! periodic-check timer. [`TimerScheduler`] keeps exactly one slot per
//! [`TimerKind`], so scheduling a kind always replaces (cancels) the
//! previous deadline of that kind, and a cancelled deadline can never fire.
//!
//! # Integration
//!
//! The scheduler is designed to sit inside a session actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         biased;
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands, maybe reschedule */ }
//!         fire = timers.next_fire() => { /* act on fire.kind */ }
//!     }
//! }
//! ```
//!
//! `next_fire` only mutates the scheduler after its sleep completes, so
//! dropping it when another branch wins loses nothing.

mod clock;

pub use clock::SessionClock;

use std::fmt;
use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{trace, warn};

// ---------------------------------------------------------------------------
// TimerKind
// ---------------------------------------------------------------------------

/// The four independent timers a session owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Opens the expiry prompt `warning_lead` before expiry.
    Warning,
    /// Ends the session after `session_timeout` of inactivity.
    Expiry,
    /// Ends the session after the tab stayed hidden too long.
    TabHidden,
    /// Repeating backend validity check.
    PeriodicCheck,
}

impl TimerKind {
    /// Every kind, in tie-break order: when two deadlines fall on the same
    /// instant, the one listed first fires first.
    pub const ALL: [TimerKind; 4] = [
        TimerKind::Warning,
        TimerKind::Expiry,
        TimerKind::TabHidden,
        TimerKind::PeriodicCheck,
    ];

    fn slot(self) -> usize {
        match self {
            Self::Warning => 0,
            Self::Expiry => 1,
            Self::TabHidden => 2,
            Self::PeriodicCheck => 3,
        }
    }
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Warning => "warning",
            Self::Expiry => "expiry",
            Self::TabHidden => "tab-hidden",
            Self::PeriodicCheck => "periodic-check",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// TimerFire (returned to caller each fire)
// ---------------------------------------------------------------------------

/// A deadline that has come due, returned by [`TimerScheduler::next_fire`].
#[derive(Debug, Clone, Copy)]
pub struct TimerFire {
    /// Which timer fired.
    pub kind: TimerKind,
    /// The instant it was scheduled for.
    pub due: TokioInstant,
    /// How late the wake-up was relative to `due`.
    pub late_by: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    due: TokioInstant,
    /// `Some` for repeating timers.
    period: Option<Duration>,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// One slot per [`TimerKind`]; at most one live deadline per kind.
#[derive(Debug, Default)]
pub struct TimerScheduler {
    slots: [Option<Armed>; 4],
    armed_total: u64,
    fired_total: u64,
}

impl TimerScheduler {
    /// Smallest period accepted for repeating timers.
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    /// Create a scheduler with nothing armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind` to fire once, `delay` from now. Replaces any previous
    /// deadline of the same kind. Returns the new deadline.
    pub fn schedule_after(&mut self, kind: TimerKind, delay: Duration) -> TokioInstant {
        let due = TokioInstant::now() + delay;
        self.schedule_at(kind, due);
        due
    }

    /// Arm `kind` to fire once at `due`. Replaces any previous deadline of
    /// the same kind. A `due` in the past fires on the next poll.
    pub fn schedule_at(&mut self, kind: TimerKind, due: TokioInstant) {
        self.arm(kind, Armed { due, period: None });
    }

    /// Arm `kind` to fire every `period`, starting one period from now
    /// plus a random jitter in `0..max_jitter`.
    ///
    /// Repeating timers re-arm themselves from the moment they fire, so a
    /// late wake-up never causes a burst of catch-up fires.
    pub fn schedule_every(
        &mut self,
        kind: TimerKind,
        period: Duration,
        max_jitter: Duration,
    ) -> TokioInstant {
        let period = if period < Self::MIN_PERIOD {
            warn!(%kind, ?period, "repeating period below minimum; clamping");
            Self::MIN_PERIOD
        } else {
            period
        };
        let jitter = if max_jitter.is_zero() {
            Duration::ZERO
        } else {
            let us = rand::rng().random_range(0..max_jitter.as_micros().max(1) as u64);
            Duration::from_micros(us)
        };
        let due = TokioInstant::now() + period + jitter;
        self.arm(
            kind,
            Armed {
                due,
                period: Some(period),
            },
        );
        due
    }

    fn arm(&mut self, kind: TimerKind, armed: Armed) {
        let replaced = self.slots[kind.slot()].replace(armed).is_some();
        self.armed_total += 1;
        trace!(%kind, replaced, "timer armed");
    }

    /// Cancel `kind`. Returns `true` if a deadline was live.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.slots[kind.slot()].take().is_some()
    }

    /// Cancel every timer. Returns how many were live.
    pub fn cancel_all(&mut self) -> usize {
        TimerKind::ALL
            .into_iter()
            .filter(|kind| self.cancel(*kind))
            .count()
    }

    /// Wait until the earliest live deadline and return it.
    ///
    /// One-shot timers are disarmed as they fire; repeating timers are
    /// re-armed for `now + period`. With nothing armed this future pends
    /// forever, leaving `tokio::select!` to service its other branches.
    pub async fn next_fire(&mut self) -> TimerFire {
        let Some((kind, armed)) = self.earliest() else {
            return std::future::pending::<TimerFire>().await;
        };

        time::sleep_until(armed.due).await;

        let now = TokioInstant::now();
        let late_by = now.saturating_duration_since(armed.due);
        self.slots[kind.slot()] = armed.period.map(|period| Armed {
            due: now + period,
            period: Some(period),
        });
        self.fired_total += 1;

        trace!(
            %kind,
            late_ms = late_by.as_secs_f64() * 1000.0,
            "timer fired"
        );

        TimerFire {
            kind,
            due: armed.due,
            late_by,
        }
    }

    fn earliest(&self) -> Option<(TimerKind, Armed)> {
        TimerKind::ALL
            .into_iter()
            .filter_map(|kind| self.slots[kind.slot()].map(|armed| (kind, armed)))
            .min_by_key(|(_, armed)| armed.due)
    }

    /// Whether `kind` currently has a live deadline.
    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    /// The live deadline for `kind`, if any.
    pub fn deadline(&self, kind: TimerKind) -> Option<TokioInstant> {
        self.slots[kind.slot()].map(|armed| armed.due)
    }

    /// Number of kinds with a live deadline (0–4).
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Total number of times any timer was armed. Only ever grows.
    pub fn armed_total(&self) -> u64 {
        self.armed_total
    }

    /// Total number of fires delivered by [`next_fire`](Self::next_fire).
    pub fn fired_total(&self) -> u64 {
        self.fired_total
    }
}
