//! Countdown events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::breakdown::Breakdown;

/// Event emitted by a countdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerEvent {
    pub kind: TimerEventKind,
    pub timestamp: DateTime<Utc>,
}

/// Types of countdown events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimerEventKind {
    /// Remaining time went down
    Changed {
        remaining_seconds: u64,
        breakdown: Breakdown,
    },
    /// Countdown reached zero
    Finished,
}

impl TimerEvent {
    pub fn new(kind: TimerEventKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }

    /// Create a changed event
    pub fn changed(remaining_seconds: u64, breakdown: Breakdown) -> Self {
        Self::new(TimerEventKind::Changed {
            remaining_seconds,
            breakdown,
        })
    }

    /// Create a finished event
    pub fn finished() -> Self {
        Self::new(TimerEventKind::Finished)
    }

    /// Remaining seconds carried by a changed event
    pub fn remaining_seconds(&self) -> Option<u64> {
        match self.kind {
            TimerEventKind::Changed {
                remaining_seconds, ..
            } => Some(remaining_seconds),
            TimerEventKind::Finished => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.kind, TimerEventKind::Finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_event() {
        let event = TimerEvent::changed(61, Breakdown::ZERO);
        assert_eq!(event.remaining_seconds(), Some(61));
        assert!(!event.is_finished());
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = TimerEvent::finished();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"]["type"], "finished");
        assert_eq!(event.remaining_seconds(), None);
    }
}
