//! One session epoch: the actor that owns all lifecycle state.
//!
//! Everything that can change the session (user activity, tab
//! visibility, timers, backend checks, host calls) arrives as an
//! [`EpochCommand`] or a timer fire and is handled on a single Tokio
//! task. Two events landing on the same tick are therefore processed one
//! after the other, and the second one sees the first one's effects.
//!
//! ```text
//!  EventSource ──(weak)──┐
//!  PromptActions ─(weak)─┤
//!  check task ───(weak)──┼──▶ mpsc ──▶ EpochActor ◀── TimerScheduler
//!  EpochHandle ─(strong)─┘                 │
//!                                          └──▶ watch<SessionPhase>
//! ```
//!
//! Only the handle keeps the actor alive. Dropping it (or calling
//! `shutdown`) stops the task, cancels its timers and detaches its
//! listeners.

use std::sync::Arc;
use std::time::Duration;

use lapse_core::{EpochId, ExpiryReason, SessionConfig, SessionPhase, Visibility};
use lapse_signals::{ActivityMonitor, EventSource, VisibilityMonitor};
use lapse_timer::{SessionClock, TimerFire, TimerKind, TimerScheduler};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::auth::AuthBackend;
use crate::error::SessionError;
use crate::expiry::ExpiryHandler;
use crate::presenter::{Navigator, Presenter, PromptActions, WarningPrompt};
use crate::state::{ClockState, SessionCallbacks, SessionSnapshot, TabReturn};
use crate::store::ArtifactStore;
use crate::validator::{CheckOutcome, SessionValidator};
use crate::warning::WarningController;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub(crate) enum EpochCommand {
    Activity,
    Visibility(Visibility),
    Extend,
    PromptLogout,
    Logout { reply: oneshot::Sender<()> },
    Checked { outcome: CheckOutcome },
    Snapshot { reply: oneshot::Sender<SessionSnapshot> },
    Shutdown { reply: oneshot::Sender<()> },
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// The manager's grip on a running epoch.
pub(crate) struct EpochHandle {
    epoch: EpochId,
    commands: mpsc::UnboundedSender<EpochCommand>,
    phase: watch::Receiver<SessionPhase>,
}

impl EpochHandle {
    pub(crate) fn epoch(&self) -> EpochId {
        self.epoch
    }

    pub(crate) fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    /// Still running and not expired.
    pub(crate) fn is_live(&self) -> bool {
        !self.commands.is_closed() && !self.phase().is_terminal()
    }

    pub(crate) fn extend(&self) -> Result<(), SessionError> {
        self.send(EpochCommand::Extend)
    }

    /// Expire with [`ExpiryReason::Logout`] and wait for the teardown.
    pub(crate) async fn logout(&self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(EpochCommand::Logout { reply })?;
        rx.await.map_err(|_| SessionError::Unavailable(self.epoch))
    }

    pub(crate) async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(EpochCommand::Snapshot { reply })?;
        rx.await.map_err(|_| SessionError::Unavailable(self.epoch))
    }

    /// Stop the actor and wait until its timers and listeners are gone.
    pub(crate) async fn shutdown(self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(EpochCommand::Shutdown { reply })?;
        rx.await.map_err(|_| SessionError::Unavailable(self.epoch))
    }

    fn send(&self, command: EpochCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::Unavailable(self.epoch))
    }
}

// ---------------------------------------------------------------------------
// Spawning
// ---------------------------------------------------------------------------

/// Everything an epoch borrows from its manager.
pub(crate) struct EpochParts<A: AuthBackend> {
    pub(crate) epoch: EpochId,
    pub(crate) config: Arc<SessionConfig>,
    pub(crate) auth: Arc<A>,
    pub(crate) source: Arc<dyn EventSource>,
    pub(crate) presenter: Arc<dyn Presenter>,
    pub(crate) navigator: Arc<dyn Navigator>,
    pub(crate) store: Arc<dyn ArtifactStore>,
    pub(crate) callbacks: SessionCallbacks,
}

/// Start an epoch: attach listeners, arm timers, spawn the actor.
///
/// Listeners and timers are live when this returns, so an event emitted
/// right after `initialize` is never lost. Must be called inside a Tokio
/// runtime.
pub(crate) fn spawn_epoch<A: AuthBackend>(parts: EpochParts<A>) -> EpochHandle {
    let EpochParts {
        epoch,
        config,
        auth,
        source,
        presenter,
        navigator,
        store,
        callbacks,
    } = parts;

    let (tx, rx) = mpsc::unbounded_channel();
    let weak = tx.downgrade();

    let activity_tx = weak.clone();
    let mut activity = ActivityMonitor::new(
        Arc::clone(&source),
        config.activity_events.iter().cloned(),
        move |_event| {
            if let Some(tx) = activity_tx.upgrade() {
                let _ = tx.send(EpochCommand::Activity);
            }
        },
    );
    let visibility_tx = weak.clone();
    let mut visibility = VisibilityMonitor::new(
        source,
        config.visibility_events.iter().cloned(),
        move |state| {
            if let Some(tx) = visibility_tx.upgrade() {
                let _ = tx.send(EpochCommand::Visibility(state));
            }
        },
    );
    activity.attach();
    visibility.attach();

    let clock = SessionClock::new();
    let now = clock.now();
    let (phase_tx, phase_rx) = watch::channel(SessionPhase::Active);
    let SessionCallbacks {
        on_expired,
        on_warning,
    } = callbacks;

    let mut actor = EpochActor {
        epoch,
        validator: SessionValidator::new(&config),
        expiry: ExpiryHandler::new(&config, Arc::clone(&auth), store, navigator, on_expired),
        warning: WarningController::new(presenter, on_warning),
        config,
        auth,
        clock,
        state: ClockState::new(now),
        phase: SessionPhase::Active,
        phase_tx,
        timers: TimerScheduler::new(),
        timers_started_at: now,
        check_in_flight: false,
        activity,
        visibility,
        commands: rx,
        weak,
    };
    actor.start_session_timers(now);
    actor.timers.schedule_every(
        TimerKind::PeriodicCheck,
        actor.config.check_interval,
        actor.config.check_jitter,
    );

    info!(
        %epoch,
        timeout_secs = actor.config.session_timeout.as_secs(),
        warning_lead_secs = actor.config.warning_lead.as_secs(),
        "session epoch started"
    );
    tokio::spawn(actor.run());

    EpochHandle {
        epoch,
        commands: tx,
        phase: phase_rx,
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct EpochActor<A: AuthBackend> {
    epoch: EpochId,
    config: Arc<SessionConfig>,
    auth: Arc<A>,
    clock: SessionClock,
    state: ClockState,
    phase: SessionPhase,
    phase_tx: watch::Sender<SessionPhase>,
    timers: TimerScheduler,
    /// Where the current warning/expiry deadlines were measured from.
    timers_started_at: Instant,
    check_in_flight: bool,
    validator: SessionValidator,
    warning: WarningController,
    expiry: ExpiryHandler<A>,
    activity: ActivityMonitor,
    visibility: VisibilityMonitor,
    commands: mpsc::UnboundedReceiver<EpochCommand>,
    weak: mpsc::WeakUnboundedSender<EpochCommand>,
}

impl<A: AuthBackend> EpochActor<A> {
    async fn run(mut self) {
        loop {
            tokio::select! {
                // Commands first: a host call or user event queued on the
                // same tick as a timer is applied before the timer.
                biased;

                command = self.commands.recv() => match command {
                    Some(EpochCommand::Shutdown { reply }) => {
                        self.stop("shutdown");
                        let _ = reply.send(());
                        return;
                    }
                    Some(command) => self.handle(command),
                    None => break,
                },

                fire = self.timers.next_fire() => self.on_timer(fire),
            }
        }
        self.stop("handle dropped");
    }

    fn handle(&mut self, command: EpochCommand) {
        match command {
            EpochCommand::Activity => self.on_activity(),
            EpochCommand::Visibility(state) => self.on_visibility(state),
            EpochCommand::Extend => self.on_extend(),
            EpochCommand::PromptLogout => self.expire(ExpiryReason::PromptLogout, None),
            EpochCommand::Logout { reply } => self.expire(ExpiryReason::Logout, Some(reply)),
            EpochCommand::Checked { outcome } => self.on_checked(outcome),
            EpochCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            // Handled in `run`.
            EpochCommand::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    // -- activity ------------------------------------------------------------

    fn on_activity(&mut self) {
        if self.phase.is_terminal() {
            trace!(epoch = %self.epoch, "activity after expiry ignored");
            return;
        }
        let now = self.clock.now();
        self.state.record_activity(now);

        let throttle = self.config.activity_throttle;
        if !throttle.is_zero()
            && self.phase == SessionPhase::Active
            && now.saturating_duration_since(self.timers_started_at) < throttle
        {
            // Recorded; the timers catch up when they fire.
            trace!(epoch = %self.epoch, "timer reset throttled");
            return;
        }
        self.reset_session_timers(now);
    }

    fn on_extend(&mut self) {
        if self.phase.is_terminal() {
            debug!(epoch = %self.epoch, "extend after expiry ignored");
            return;
        }
        let now = self.clock.now();
        self.state.record_activity(now);
        self.reset_session_timers(now);
        debug!(epoch = %self.epoch, "session extended");
    }

    /// Dismiss any warning and restart both session timers from `now`.
    fn reset_session_timers(&mut self, now: Instant) {
        if self.warning.hide() {
            debug!(epoch = %self.epoch, "warning dismissed");
        }
        self.set_phase(SessionPhase::Active);
        self.start_session_timers(now);
    }

    /// Arm warning and expiry relative to `from`, replacing any previous
    /// deadlines.
    fn start_session_timers(&mut self, from: Instant) {
        self.timers
            .schedule_at(TimerKind::Warning, from + self.config.warning_delay());
        self.timers
            .schedule_at(TimerKind::Expiry, from + self.config.session_timeout);
        self.timers_started_at = from;
    }

    /// Activity the throttle absorbed since the timers were armed.
    fn absorbed_activity(&self) -> Option<Instant> {
        let last = self.state.last_activity_at;
        (last > self.timers_started_at).then_some(last)
    }

    // -- visibility ----------------------------------------------------------

    fn on_visibility(&mut self, visibility: Visibility) {
        if self.phase.is_terminal() {
            trace!(epoch = %self.epoch, "visibility change after expiry ignored");
            return;
        }
        let now = self.clock.now();
        let grace = self.config.tab_hidden_timeout;

        match visibility {
            Visibility::Hidden => {
                if self.state.mark_hidden(now) {
                    self.timers.schedule_at(TimerKind::TabHidden, now + grace);
                    debug!(epoch = %self.epoch, grace_secs = grace.as_secs(), "tab hidden");
                } else {
                    trace!(epoch = %self.epoch, "tab already hidden");
                }
            }
            Visibility::Visible => match self.state.mark_visible(now, grace) {
                TabReturn::GraceElapsed { away } => {
                    info!(
                        epoch = %self.epoch,
                        away_secs = away.as_secs(),
                        "tab returned after grace window"
                    );
                    self.expire(ExpiryReason::TabHiddenOnReturn, None);
                }
                TabReturn::WithinGrace { away } => {
                    self.timers.cancel(TimerKind::TabHidden);
                    debug!(epoch = %self.epoch, away_ms = away.as_millis() as u64, "tab visible again");
                    self.state.record_activity(now);
                    self.reset_session_timers(now);
                }
                TabReturn::WasVisible => {
                    self.state.record_activity(now);
                    self.reset_session_timers(now);
                }
            },
        }
    }

    // -- timers --------------------------------------------------------------

    fn on_timer(&mut self, fire: TimerFire) {
        if !fire.late_by.is_zero() {
            trace!(epoch = %self.epoch, kind = %fire.kind, late_by = ?fire.late_by, "timer fired late");
        }
        match fire.kind {
            TimerKind::Warning => self.on_warning_due(),
            TimerKind::Expiry => self.on_expiry_due(),
            TimerKind::TabHidden => self.expire(ExpiryReason::TabHidden, None),
            TimerKind::PeriodicCheck => self.start_check(),
        }
    }

    fn on_warning_due(&mut self) {
        if let Some(from) = self.absorbed_activity() {
            self.start_session_timers(from);
            return;
        }
        let now = self.clock.now();
        self.set_phase(SessionPhase::WarningShown);
        let prompt = WarningPrompt {
            epoch: self.epoch,
            expires_in: self
                .state
                .time_until_expiry(now, self.config.session_timeout),
            actions: PromptActions::new(self.epoch, self.weak.clone()),
        };
        let expires_in = prompt.expires_in;
        if self.warning.show(prompt) {
            info!(
                epoch = %self.epoch,
                expires_in_secs = expires_in.as_secs(),
                "session expiring soon; warning shown"
            );
        }
    }

    fn on_expiry_due(&mut self) {
        if let Some(from) = self.absorbed_activity() {
            self.start_session_timers(from);
            return;
        }
        self.expire(ExpiryReason::Inactivity, None);
    }

    // -- backend checks ------------------------------------------------------

    fn start_check(&mut self) {
        if self.check_in_flight {
            debug!(epoch = %self.epoch, "previous session check still running; skipping");
            return;
        }
        self.check_in_flight = true;

        let auth = Arc::clone(&self.auth);
        let validator = self.validator;
        let weak = self.weak.clone();
        let epoch = self.epoch;
        tokio::spawn(async move {
            let outcome = validator.fetch(&*auth).await;
            match weak.upgrade() {
                Some(tx) => {
                    let _ = tx.send(EpochCommand::Checked { outcome });
                }
                None => trace!(%epoch, "session check finished after epoch ended"),
            }
        });
    }

    fn on_checked(&mut self, outcome: CheckOutcome) {
        self.check_in_flight = false;
        if self.phase.is_terminal() {
            debug!(epoch = %self.epoch, "session check result after expiry ignored");
            return;
        }
        let now = self.clock.now();
        let wall_now = self.clock.wall_now();
        match self.validator.evaluate(&outcome, &self.state, now, wall_now) {
            Ok(()) => trace!(epoch = %self.epoch, "session check passed"),
            Err(reason) => {
                if let Err(e) = &outcome {
                    warn!(epoch = %self.epoch, error = %e, "session check failed");
                }
                self.expire(reason, None);
            }
        }
    }

    // -- expiry --------------------------------------------------------------

    /// End the epoch. Idempotent: only the first call does anything, but
    /// every `reply` is answered.
    fn expire(&mut self, reason: ExpiryReason, reply: Option<oneshot::Sender<()>>) {
        if self.phase.is_terminal() {
            debug!(epoch = %self.epoch, %reason, "session already expired");
            if let Some(reply) = reply {
                let _ = reply.send(());
            }
            return;
        }

        let cancelled = self.timers.cancel_all();
        self.warning.hide();
        self.set_phase(SessionPhase::Expired);
        self.activity.detach();
        self.visibility.detach();
        self.check_in_flight = false;
        info!(epoch = %self.epoch, %reason, cancelled, "session expired");

        let teardown = self.expiry.teardown(self.epoch, reason);
        tokio::spawn(async move {
            teardown.run().await;
            if let Some(reply) = reply {
                let _ = reply.send(());
            }
        });
    }

    fn set_phase(&mut self, next: SessionPhase) {
        if self.phase == next {
            return;
        }
        if !self.phase.can_transition_to(next) {
            warn!(epoch = %self.epoch, from = %self.phase, to = %next, "unexpected phase transition");
            return;
        }
        debug!(epoch = %self.epoch, from = %self.phase, to = %next, "phase changed");
        self.phase = next;
        self.phase_tx.send_replace(next);
    }

    fn snapshot(&self) -> SessionSnapshot {
        let now = self.clock.now();
        let time_until_expiry = if self.phase.is_terminal() {
            Duration::ZERO
        } else {
            self.state
                .time_until_expiry(now, self.config.session_timeout)
        };
        SessionSnapshot {
            epoch: self.epoch,
            phase: self.phase,
            time_until_expiry,
            expiring_soon: time_until_expiry <= self.config.warning_lead,
            warning_shown: self.warning.is_shown(),
            tab_visible: self.state.tab_visible,
            live_timers: self.timers.live_count(),
            armed_total: self.timers.armed_total(),
        }
    }

    /// Release timers, prompt and listeners.
    fn stop(&mut self, why: &'static str) {
        let cancelled = self.timers.cancel_all();
        self.warning.hide();
        self.activity.detach();
        self.visibility.detach();
        info!(epoch = %self.epoch, phase = %self.phase, cancelled, why, "session epoch stopped");
    }
}
