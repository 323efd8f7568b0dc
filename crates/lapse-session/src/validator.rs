//! Periodic validation against the auth backend.
//!
//! The check is split in two so the decision can be tested without a
//! backend: [`SessionValidator::fetch`] asks the backend (bounded by the
//! auth timeout), [`SessionValidator::evaluate`] turns the answer plus
//! the local clock state into "keep going" or an [`ExpiryReason`].
//!
//! Every failure mode fails closed. An unreachable backend, a missing
//! session, a past declared expiry and the local idle/hidden backstops
//! all end the session.

use std::time::{Duration, SystemTime};

use lapse_core::{ExpiryReason, SessionConfig};
use tokio::time::Instant;

use crate::auth::{AuthBackend, SessionInfo};
use crate::error::AuthError;
use crate::state::ClockState;

/// The outcome of one backend fetch.
pub type CheckOutcome = Result<Option<SessionInfo>, AuthError>;

/// Thresholds copied out of the config, so checks can run on a spawned
/// task without holding the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionValidator {
    session_timeout: Duration,
    tab_hidden_timeout: Duration,
    auth_timeout: Duration,
}

impl SessionValidator {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            session_timeout: config.session_timeout,
            tab_hidden_timeout: config.tab_hidden_timeout,
            auth_timeout: config.auth_timeout,
        }
    }

    /// Ask the backend for the current session.
    ///
    /// A backend slower than the auth timeout yields
    /// [`AuthError::Timeout`].
    pub async fn fetch<A: AuthBackend>(&self, auth: &A) -> CheckOutcome {
        match tokio::time::timeout(self.auth_timeout, auth.current_session()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AuthError::Timeout(self.auth_timeout)),
        }
    }

    /// Decide whether the session survives this check.
    ///
    /// Rules are applied in order; the first match wins.
    pub fn evaluate(
        &self,
        outcome: &CheckOutcome,
        clock: &ClockState,
        now: Instant,
        wall_now: SystemTime,
    ) -> Result<(), ExpiryReason> {
        let info = match outcome {
            Err(_) => return Err(ExpiryReason::CheckFailed),
            Ok(None) => return Err(ExpiryReason::NoSession),
            Ok(Some(info)) => info,
        };

        if wall_now >= info.expires_at {
            return Err(ExpiryReason::DeclaredExpiry);
        }

        // Backstops for timers that were throttled or never fired.
        if clock.idle_for(now) >= self.session_timeout {
            return Err(ExpiryReason::IdleBackstop);
        }
        if let Some(hidden) = clock.hidden_for(now) {
            if hidden >= self.tab_hidden_timeout {
                return Err(ExpiryReason::TabHiddenBackstop);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config() -> SessionConfig {
        let mut config =
            SessionConfig::with_timeouts(Duration::from_secs(300), Duration::from_secs(60));
        config.tab_hidden_timeout = Duration::from_secs(30);
        config.auth_timeout = Duration::from_secs(5);
        config
    }

    fn valid_for(secs: u64) -> CheckOutcome {
        Ok(Some(SessionInfo {
            expires_at: SystemTime::now() + Duration::from_secs(secs),
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluate_valid_session_passes() {
        let validator = SessionValidator::new(&config());
        let now = Instant::now();
        let clock = ClockState::new(now);

        let verdict = validator.evaluate(&valid_for(3600), &clock, now, SystemTime::now());
        assert_eq!(verdict, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluate_error_fails_closed() {
        let validator = SessionValidator::new(&config());
        let now = Instant::now();
        let clock = ClockState::new(now);
        let outcome = Err(AuthError::Transport("connection refused".into()));

        let verdict = validator.evaluate(&outcome, &clock, now, SystemTime::now());
        assert_eq!(verdict, Err(ExpiryReason::CheckFailed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluate_missing_session_expires() {
        let validator = SessionValidator::new(&config());
        let now = Instant::now();
        let clock = ClockState::new(now);

        let verdict = validator.evaluate(&Ok(None), &clock, now, SystemTime::now());
        assert_eq!(verdict, Err(ExpiryReason::NoSession));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluate_declared_expiry_in_past_expires() {
        let validator = SessionValidator::new(&config());
        let now = Instant::now();
        let clock = ClockState::new(now);
        let wall = SystemTime::now();
        let outcome = Ok(Some(SessionInfo { expires_at: wall }));

        // expires_at == now counts as expired.
        let verdict = validator.evaluate(&outcome, &clock, now, wall);
        assert_eq!(verdict, Err(ExpiryReason::DeclaredExpiry));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluate_idle_backstop_catches_missed_timer() {
        let validator = SessionValidator::new(&config());
        let start = Instant::now();
        let clock = ClockState::new(start);
        let now = start + Duration::from_secs(300);

        let verdict = validator.evaluate(&valid_for(3600), &clock, now, SystemTime::now());
        assert_eq!(verdict, Err(ExpiryReason::IdleBackstop));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluate_hidden_backstop_catches_suspended_tab() {
        let validator = SessionValidator::new(&config());
        let start = Instant::now();
        let mut clock = ClockState::new(start);
        clock.mark_hidden(start);
        let now = start + Duration::from_secs(30);

        let verdict = validator.evaluate(&valid_for(3600), &clock, now, SystemTime::now());
        assert_eq!(verdict, Err(ExpiryReason::TabHiddenBackstop));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluate_hidden_within_grace_passes() {
        let validator = SessionValidator::new(&config());
        let start = Instant::now();
        let mut clock = ClockState::new(start);
        clock.mark_hidden(start);
        let now = start + Duration::from_secs(29);

        let verdict = validator.evaluate(&valid_for(3600), &clock, now, SystemTime::now());
        assert_eq!(verdict, Ok(()));
    }

    // -- fetch ---------------------------------------------------------------

    struct Slow {
        calls: AtomicUsize,
    }

    impl AuthBackend for Slow {
        async fn current_session(&self) -> CheckOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_slow_backend_times_out() {
        let validator = SessionValidator::new(&config());
        let backend = Slow {
            calls: AtomicUsize::new(0),
        };

        let outcome = validator.fetch(&backend).await;

        assert!(matches!(outcome, Err(AuthError::Timeout(d)) if d == Duration::from_secs(5)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }
}
