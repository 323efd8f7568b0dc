//! Monotonic and wall-clock time for a session.

use std::time::SystemTime;

use tokio::time::Instant as TokioInstant;

/// The two time sources a session reads.
///
/// Inactivity and tab-hidden windows are measured on the monotonic side,
/// which follows Tokio's clock and can be paused in tests. The backend
/// declares session expiry as a wall-clock timestamp, so that comparison
/// reads the system clock directly. Monotonic time may stall while the
/// host sleeps; the system clock keeps counting, so a declared expiry that
/// passed during a suspend is still seen on the next check.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionClock;

impl SessionClock {
    pub fn new() -> Self {
        Self
    }

    /// Current monotonic time.
    pub fn now(&self) -> TokioInstant {
        TokioInstant::now()
    }

    /// Current wall-clock time from the system clock.
    pub fn wall_now(&self) -> SystemTime {
        SystemTime::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_wall_now_ignores_monotonic_jumps() {
        let clock = SessionClock::new();
        let start = clock.now();

        tokio::time::advance(Duration::from_secs(2 * 3600)).await;
        assert_eq!(clock.now() - start, Duration::from_secs(2 * 3600));

        // Wall time stays with the system clock, not two hours ahead.
        let skew = match clock.wall_now().duration_since(SystemTime::now()) {
            Ok(ahead) => ahead,
            Err(behind) => behind.duration(),
        };
        assert!(skew < Duration::from_secs(5));
    }
}
