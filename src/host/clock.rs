//! Wall-clock sources injected into the engine

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use chrono::{DateTime, FixedOffset, Local, TimeDelta, Utc};
use tokio::time::Instant;

/// Source of "now" for the countdown
///
/// Instants carry the UTC offset valid at that instant in the host's zone,
/// which is what the calendar-day count compares.
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> DateTime<FixedOffset>;

    /// Express `instant` in the same zone as [`Clock::now`]
    fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset>;
}

/// Host clock in the local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }

    fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&Local).fixed_offset()
    }
}

/// Wall clock that advances with tokio's clock, plus any skew applied by hand
///
/// Paired with a paused tokio runtime this gives deterministic time: tokio
/// time moves both the timers and this clock, while [`ManualClock::skew`]
/// moves only the wall clock, which is exactly what a host suspension looks
/// like to a process.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<ManualClockInner>,
}

#[derive(Debug)]
struct ManualClockInner {
    origin: DateTime<FixedOffset>,
    started: Instant,
    skew: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock reading `origin` right now
    pub fn new(origin: DateTime<FixedOffset>) -> Self {
        Self {
            inner: Arc::new(ManualClockInner {
                origin,
                started: Instant::now(),
                skew: Mutex::new(Duration::ZERO),
            }),
        }
    }

    /// Move the wall clock forward without moving tokio's clock
    pub fn skew(&self, by: Duration) {
        let mut skew = self.inner.skew.lock().unwrap_or_else(|e| e.into_inner());
        *skew += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        let skew = *self.inner.skew.lock().unwrap_or_else(|e| e.into_inner());
        let elapsed = self.inner.started.elapsed() + skew;
        TimeDelta::from_std(elapsed)
            .ok()
            .and_then(|delta| self.inner.origin.checked_add_signed(delta))
            .unwrap_or(self.inner.origin)
    }

    fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(self.inner.origin.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-01T10:00:00+02:00").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_clock_follows_tokio_time() {
        let clock = ManualClock::new(origin());
        assert_eq!(clock.now(), origin());

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(clock.now(), origin() + TimeDelta::seconds(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_clock_skew_moves_wall_time_only() {
        let clock = ManualClock::new(origin());
        let before = Instant::now();

        clock.skew(Duration::from_secs(30));

        assert_eq!(Instant::now(), before);
        assert_eq!(clock.now(), origin() + TimeDelta::seconds(30));
    }

    #[test]
    fn test_localize_keeps_the_instant() {
        let clock = ManualClock::new(origin());
        let target = Utc::now();

        let local = clock.localize(target);
        assert_eq!(local, target);
        assert_eq!(local.offset(), origin().offset());
    }

    #[test]
    fn test_system_clock_localize_matches_now_zone() {
        let clock = SystemClock;
        let now = clock.now();
        let localized = clock.localize(now.with_timezone(&Utc));

        assert_eq!(localized, now);
    }
}
