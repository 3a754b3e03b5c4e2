//! Background-safe schedule that resyncs against the wall clock

use std::{sync::Arc, time::Duration};
use chrono::{DateTime, FixedOffset};
use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use super::{Schedule, ScheduleError, TickFn, TickOutcome};
use crate::host::{Clock, SuspendMonitor};

/// Schedule whose ticks are measured on the wall clock
///
/// Elapsed time is always computed as the wall-clock distance from the arm
/// instant minus the seconds already delivered, so the countdown never
/// drifts. Ticks are held back while the host reports suspension, and a
/// single resync tick covering the whole gap is delivered on resume.
pub struct BackgroundResync {
    period: Duration,
    clock: Arc<dyn Clock>,
    monitor: SuspendMonitor,
    task: Option<JoinHandle<()>>,
}

impl BackgroundResync {
    pub fn new(period: Duration, clock: Arc<dyn Clock>, monitor: SuspendMonitor) -> Self {
        Self {
            period,
            clock,
            monitor,
            task: None,
        }
    }
}

/// Whole seconds between `anchor` and `now`, rounded to the nearest second
fn wall_seconds_since(anchor: &DateTime<FixedOffset>, now: &DateTime<FixedOffset>) -> u64 {
    let millis = now.signed_duration_since(*anchor).num_milliseconds().max(0) as u64;
    (millis + 500) / 1_000
}

impl Schedule for BackgroundResync {
    fn arm(&mut self, initial_remaining: u64, on_tick: TickFn) -> Result<(), ScheduleError> {
        self.cancel();
        let runtime = Handle::try_current().map_err(|_| ScheduleError::NoRuntime)?;

        // Anchor and suspension baseline are taken now, not when the task
        // first runs, so a suspension right after arming is still seen.
        let clock = Arc::clone(&self.clock);
        let anchor = clock.now();
        let mut suspend_rx = self.monitor.subscribe();
        let mut seen = *suspend_rx.borrow_and_update();
        let period = self.period;
        let start = Instant::now() + period;

        debug!("Arming background ticks for {} seconds", initial_remaining);
        self.task = Some(runtime.spawn(async move {
            let mut interval = interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let mut monitor_alive = true;
            let mut delivered = 0u64;
            let mut left = initial_remaining;

            while left > 0 {
                let resync = tokio::select! {
                    _ = interval.tick() => false,
                    changed = suspend_rx.changed(), if monitor_alive => {
                        if changed.is_err() {
                            monitor_alive = false;
                            continue;
                        }
                        let state = *suspend_rx.borrow_and_update();
                        let resumed = state.resumes > seen.resumes;
                        seen = state;
                        if !resumed {
                            continue;
                        }
                        interval.reset();
                        true
                    }
                };

                if seen.suspended && !resync {
                    continue;
                }

                let total = wall_seconds_since(&anchor, &clock.now());
                let elapsed = total.saturating_sub(delivered).min(left);
                if elapsed == 0 {
                    continue;
                }
                delivered += elapsed;
                left -= elapsed;

                if resync {
                    info!("Host resumed, resyncing countdown by {} seconds", elapsed);
                }

                if on_tick(elapsed) == TickOutcome::Done {
                    break;
                }
            }
            debug!("Background ticks finished");
        }));

        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Background ticks cancelled");
        }
    }

    fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for BackgroundResync {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use crate::host::ManualClock;

    fn clock() -> ManualClock {
        ManualClock::new(DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").unwrap())
    }

    fn recorder() -> (Arc<Mutex<Vec<u64>>>, TickFn) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let on_tick: TickFn = Arc::new(move |elapsed| {
            sink.lock().unwrap().push(elapsed);
            TickOutcome::Continue
        });
        (seen, on_tick)
    }

    #[test]
    fn test_wall_seconds_round_to_nearest() {
        let anchor = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").unwrap();
        let at = |millis| anchor + chrono::TimeDelta::milliseconds(millis);

        assert_eq!(wall_seconds_since(&anchor, &at(999)), 1);
        assert_eq!(wall_seconds_since(&anchor, &at(1_499)), 1);
        assert_eq!(wall_seconds_since(&anchor, &at(1_500)), 2);
        assert_eq!(wall_seconds_since(&anchor, &at(-2_000)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_regular_ticks_are_one_second() {
        let clock = clock();
        let (seen, on_tick) = recorder();
        let mut schedule =
            BackgroundResync::new(Duration::from_secs(1), Arc::new(clock), SuspendMonitor::new());
        schedule.arm(10, on_tick).unwrap();

        tokio::time::sleep(Duration::from_millis(4_500)).await;
        assert_eq!(*seen.lock().unwrap(), vec![1, 1, 1, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_collapses_gap_into_one_tick() {
        let clock = clock();
        let monitor = SuspendMonitor::new();
        let (seen, on_tick) = recorder();
        let mut schedule =
            BackgroundResync::new(Duration::from_secs(1), Arc::new(clock.clone()), monitor.clone());
        schedule.arm(100, on_tick).unwrap();

        tokio::time::sleep(Duration::from_millis(2_100)).await;
        monitor.set_suspended(true);
        clock.skew(Duration::from_secs(30));
        monitor.set_suspended(false);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(*seen.lock().unwrap(), vec![1, 1, 30]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_held_while_suspended() {
        let clock = clock();
        let monitor = SuspendMonitor::new();
        let (seen, on_tick) = recorder();
        let mut schedule =
            BackgroundResync::new(Duration::from_secs(1), Arc::new(clock.clone()), monitor.clone());
        schedule.arm(100, on_tick).unwrap();

        monitor.set_suspended(true);
        tokio::time::sleep(Duration::from_millis(5_400)).await;
        assert!(seen.lock().unwrap().is_empty());

        monitor.set_suspended(false);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*seen.lock().unwrap(), vec![5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resync_never_exceeds_initial_remaining() {
        let clock = clock();
        let monitor = SuspendMonitor::new();
        let (seen, on_tick) = recorder();
        let mut schedule =
            BackgroundResync::new(Duration::from_secs(1), Arc::new(clock.clone()), monitor.clone());
        schedule.arm(20, on_tick).unwrap();

        clock.skew(Duration::from_secs(3_600));
        monitor.notify_resumed();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(*seen.lock().unwrap(), vec![20]);
        assert!(!schedule.is_armed());
    }
}
