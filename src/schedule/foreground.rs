//! Foreground interval schedule

use std::time::Duration;
use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

use super::{Schedule, ScheduleError, TickFn, TickOutcome};

/// Fires once per period while the process is scheduled
///
/// Every fire counts as one second. Periods missed while the process was not
/// running are skipped rather than replayed, so a suspended process simply
/// falls behind the wall clock.
#[derive(Debug)]
pub struct ForegroundInterval {
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl ForegroundInterval {
    pub fn new(period: Duration) -> Self {
        Self { period, task: None }
    }
}

impl Schedule for ForegroundInterval {
    fn arm(&mut self, initial_remaining: u64, on_tick: TickFn) -> Result<(), ScheduleError> {
        self.cancel();
        let runtime = Handle::try_current().map_err(|_| ScheduleError::NoRuntime)?;

        let period = self.period;
        let start = Instant::now() + period;

        debug!("Arming foreground ticks for {} seconds", initial_remaining);
        self.task = Some(runtime.spawn(async move {
            let mut interval = interval_at(start, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let mut left = initial_remaining;
            while left > 0 {
                interval.tick().await;
                left -= 1;

                if on_tick(1) == TickOutcome::Done {
                    break;
                }
            }
            debug!("Foreground ticks finished");
        }));

        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Foreground ticks cancelled");
        }
    }

    fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ForegroundInterval {
    fn drop(&mut self) {
        self.cancel();
    }
}
