//! Integration tests for the session timer scheduler.
//!
//! Uses `tokio::time::pause()` (via `start_paused`) to control time
//! deterministically: sleeps resolve as soon as the runtime is idle and
//! the clock auto-advances to the next deadline.

use std::time::Duration;

use lapse_timer::{TimerKind, TimerScheduler};
use tokio::time::Instant;

// =========================================================================
// Arming and cancelling
// =========================================================================

#[test]
fn test_new_scheduler_has_nothing_armed() {
    let s = TimerScheduler::new();
    assert_eq!(s.live_count(), 0);
    assert_eq!(s.armed_total(), 0);
    for kind in TimerKind::ALL {
        assert!(!s.is_armed(kind));
    }
}

#[tokio::test(start_paused = true)]
async fn test_schedule_same_kind_replaces_previous_deadline() {
    let mut s = TimerScheduler::new();
    let first = s.schedule_after(TimerKind::Warning, Duration::from_secs(10));
    let second = s.schedule_after(TimerKind::Warning, Duration::from_secs(20));

    assert_eq!(s.live_count(), 1, "never two live timers of one kind");
    assert_eq!(s.deadline(TimerKind::Warning), Some(second));
    assert_ne!(first, second);
    assert_eq!(s.armed_total(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_reports_whether_live() {
    let mut s = TimerScheduler::new();
    s.schedule_after(TimerKind::Expiry, Duration::from_secs(1));

    assert!(s.cancel(TimerKind::Expiry));
    assert!(!s.cancel(TimerKind::Expiry), "second cancel is a no-op");
    assert!(!s.is_armed(TimerKind::Expiry));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_all_counts_live_timers() {
    let mut s = TimerScheduler::new();
    s.schedule_after(TimerKind::Warning, Duration::from_secs(1));
    s.schedule_after(TimerKind::Expiry, Duration::from_secs(2));
    s.schedule_every(TimerKind::PeriodicCheck, Duration::from_secs(3), Duration::ZERO);

    assert_eq!(s.cancel_all(), 3);
    assert_eq!(s.live_count(), 0);
    assert_eq!(s.cancel_all(), 0);
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_next_fire_returns_earliest_deadline() {
    let start = Instant::now();
    let mut s = TimerScheduler::new();
    s.schedule_after(TimerKind::Expiry, Duration::from_secs(300));
    s.schedule_after(TimerKind::Warning, Duration::from_secs(240));

    let fire = s.next_fire().await;
    assert_eq!(fire.kind, TimerKind::Warning);
    assert_eq!(Instant::now() - start, Duration::from_secs(240));
    assert!(!s.is_armed(TimerKind::Warning), "one-shot disarms on fire");

    let fire = s.next_fire().await;
    assert_eq!(fire.kind, TimerKind::Expiry);
    assert_eq!(Instant::now() - start, Duration::from_secs(300));
    assert_eq!(s.fired_total(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_equal_deadlines_fire_in_tie_break_order() {
    let mut s = TimerScheduler::new();
    s.schedule_every(TimerKind::PeriodicCheck, Duration::from_secs(60), Duration::ZERO);
    s.schedule_after(TimerKind::TabHidden, Duration::from_secs(60));

    assert_eq!(s.next_fire().await.kind, TimerKind::TabHidden);
    assert_eq!(s.next_fire().await.kind, TimerKind::PeriodicCheck);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_timer_never_fires() {
    let mut s = TimerScheduler::new();
    s.schedule_after(TimerKind::Expiry, Duration::from_secs(5));
    s.cancel(TimerKind::Expiry);

    let result = tokio::time::timeout(Duration::from_secs(60), s.next_fire()).await;
    assert!(result.is_err(), "nothing armed: next_fire should pend");
}

#[tokio::test(start_paused = true)]
async fn test_repeating_timer_rearms_after_fire() {
    let start = Instant::now();
    let mut s = TimerScheduler::new();
    s.schedule_every(TimerKind::PeriodicCheck, Duration::from_secs(30), Duration::ZERO);

    for n in 1..=3u64 {
        let fire = s.next_fire().await;
        assert_eq!(fire.kind, TimerKind::PeriodicCheck);
        assert_eq!(Instant::now() - start, Duration::from_secs(30 * n));
    }
    assert!(s.is_armed(TimerKind::PeriodicCheck));
    assert_eq!(s.armed_total(), 1, "re-arming on fire is not a new schedule");
}

#[tokio::test(start_paused = true)]
async fn test_jitter_only_delays_first_fire() {
    let start = Instant::now();
    let mut s = TimerScheduler::new();
    let first = s.schedule_every(
        TimerKind::PeriodicCheck,
        Duration::from_secs(10),
        Duration::from_millis(500),
    );

    let offset = first - start;
    assert!(offset >= Duration::from_secs(10));
    assert!(offset < Duration::from_millis(10_500));

    // Paused timers resolve to the millisecond, so measure the re-arm from
    // the instant the first fire was observed.
    s.next_fire().await;
    let fired_at = Instant::now();
    let second = s.deadline(TimerKind::PeriodicCheck).unwrap();
    assert_eq!(second - fired_at, Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_past_deadline_fires_immediately_and_reports_lateness() {
    let mut s = TimerScheduler::new();
    let due = Instant::now();
    tokio::time::advance(Duration::from_secs(2)).await;
    s.schedule_at(TimerKind::Warning, due);

    let fire = s.next_fire().await;
    assert_eq!(fire.kind, TimerKind::Warning);
    assert_eq!(fire.late_by, Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_zero_period_is_clamped() {
    let mut s = TimerScheduler::new();
    s.schedule_every(TimerKind::PeriodicCheck, Duration::ZERO, Duration::ZERO);
    let start = Instant::now();

    s.next_fire().await;
    assert_eq!(Instant::now() - start, TimerScheduler::MIN_PERIOD);
}

#[test]
fn test_timer_kind_display() {
    assert_eq!(TimerKind::TabHidden.to_string(), "tab-hidden");
    assert_eq!(TimerKind::PeriodicCheck.to_string(), "periodic-check");
}
