//! Timer state structure and lifecycle phases

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    /// No target set, or the target is already reached
    Idle,
    /// Target set and breakdown computed, not ticking
    Initialized,
    /// Ticks are being delivered
    Running,
    /// Reached zero; terminal until a new target is set
    Finished,
    /// Stopped on request; can be started again
    Stopped,
}

impl TimerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Initialized => "initialized",
            TimerPhase::Running => "running",
            TimerPhase::Finished => "finished",
            TimerPhase::Stopped => "stopped",
        }
    }

    /// Whether `start` may move this phase to running
    pub fn can_start(&self) -> bool {
        matches!(self, TimerPhase::Initialized | TimerPhase::Stopped)
    }
}

/// State of a countdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub target: Option<DateTime<FixedOffset>>,
    pub remaining_seconds: u64,
    pub phase: TimerPhase,
    pub background_capable: bool,
}

impl TimerState {
    /// Create an idle timer state
    pub fn new(background_capable: bool) -> Self {
        Self {
            target: None,
            remaining_seconds: 0,
            phase: TimerPhase::Idle,
            background_capable,
        }
    }

    /// Check if ticks are being delivered
    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    /// Check if the countdown reached zero
    pub fn is_finished(&self) -> bool {
        self.phase == TimerPhase::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = TimerState::new(true);
        assert_eq!(state.phase, TimerPhase::Idle);
        assert_eq!(state.remaining_seconds, 0);
        assert!(state.background_capable);
        assert!(!state.is_running());
    }

    #[test]
    fn test_startable_phases() {
        assert!(TimerPhase::Initialized.can_start());
        assert!(TimerPhase::Stopped.can_start());
        assert!(!TimerPhase::Idle.can_start());
        assert!(!TimerPhase::Running.can_start());
        assert!(!TimerPhase::Finished.can_start());
    }

    #[test]
    fn test_phase_strings() {
        assert_eq!(TimerPhase::Running.as_str(), "running");
        assert_eq!(
            serde_json::to_string(&TimerPhase::Finished).unwrap(),
            "\"finished\""
        );
    }
}
