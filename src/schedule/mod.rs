//! Tick scheduling module
//!
//! A schedule drives the countdown by calling a tick callback with the number
//! of whole seconds that elapsed since the previous tick. Two strategies sit
//! behind the [`Schedule`] interface: a plain foreground interval, and a
//! background-safe strategy that resyncs against the wall clock when the host
//! resumes from suspension.

pub mod background;
pub mod foreground;

use std::{sync::Arc, time::Duration};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::host::{Clock, SuspendMonitor};

pub use background::BackgroundResync;
pub use foreground::ForegroundInterval;

/// Period between regular ticks
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// What the schedule should do after delivering a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Done,
}

/// Tick callback, called with the whole seconds elapsed since the last tick
pub type TickFn = Arc<dyn Fn(u64) -> TickOutcome + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("no tokio runtime available to drive the countdown")]
    NoRuntime,
}

/// Scheduling strategy interface
pub trait Schedule: Send {
    /// Start delivering ticks for a countdown with `initial_remaining`
    /// seconds left, replacing any previous arming.
    fn arm(&mut self, initial_remaining: u64, on_tick: TickFn) -> Result<(), ScheduleError>;

    /// Stop delivering ticks. Returns once the scheduled task is aborted.
    fn cancel(&mut self);

    /// Whether ticks are currently being delivered
    fn is_armed(&self) -> bool;
}

/// Which strategy a schedule uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    Foreground,
    Background,
}

/// Scheduling strategy chosen at construction
pub enum Scheduler {
    Foreground(ForegroundInterval),
    Background(BackgroundResync),
}

impl Scheduler {
    /// Pick a strategy
    ///
    /// Background scheduling needs a host suspension facility; without one
    /// this falls back to the foreground interval.
    pub fn select(
        background: bool,
        monitor: Option<SuspendMonitor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        match (background, monitor) {
            (true, Some(monitor)) => {
                Scheduler::Background(BackgroundResync::new(TICK_PERIOD, clock, monitor))
            }
            (true, None) => {
                warn!("Background scheduling requested but no host suspension facility is available, using foreground ticks");
                Scheduler::Foreground(ForegroundInterval::new(TICK_PERIOD))
            }
            (false, _) => Scheduler::Foreground(ForegroundInterval::new(TICK_PERIOD)),
        }
    }

    pub fn mode(&self) -> ScheduleMode {
        match self {
            Scheduler::Foreground(_) => ScheduleMode::Foreground,
            Scheduler::Background(_) => ScheduleMode::Background,
        }
    }
}

impl Schedule for Scheduler {
    fn arm(&mut self, initial_remaining: u64, on_tick: TickFn) -> Result<(), ScheduleError> {
        match self {
            Scheduler::Foreground(schedule) => schedule.arm(initial_remaining, on_tick),
            Scheduler::Background(schedule) => schedule.arm(initial_remaining, on_tick),
        }
    }

    fn cancel(&mut self) {
        match self {
            Scheduler::Foreground(schedule) => schedule.cancel(),
            Scheduler::Background(schedule) => schedule.cancel(),
        }
    }

    fn is_armed(&self) -> bool {
        match self {
            Scheduler::Foreground(schedule) => schedule.is_armed(),
            Scheduler::Background(schedule) => schedule.is_armed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SystemClock;

    #[test]
    fn test_select_foreground() {
        let scheduler = Scheduler::select(false, Some(SuspendMonitor::new()), Arc::new(SystemClock));
        assert_eq!(scheduler.mode(), ScheduleMode::Foreground);
    }

    #[test]
    fn test_select_background_with_monitor() {
        let scheduler = Scheduler::select(true, Some(SuspendMonitor::new()), Arc::new(SystemClock));
        assert_eq!(scheduler.mode(), ScheduleMode::Background);
    }

    #[test]
    fn test_select_background_without_monitor_falls_back() {
        let scheduler = Scheduler::select(true, None, Arc::new(SystemClock));
        assert_eq!(scheduler.mode(), ScheduleMode::Foreground);
    }

    #[test]
    fn test_arm_outside_runtime_fails() {
        let mut scheduler = Scheduler::select(false, None, Arc::new(SystemClock));
        let result = scheduler.arm(10, Arc::new(|_: u64| TickOutcome::Continue));

        assert!(matches!(result, Err(ScheduleError::NoRuntime)));
        assert!(!scheduler.is_armed());
    }
}
