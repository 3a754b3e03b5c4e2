//! Until - a calendar-aware countdown engine
//!
//! This library computes the days/hours/minutes/seconds left until a target
//! instant and drives a once-per-second countdown that stays accurate when
//! the host process is suspended, notifying subscribers on every tick and
//! once on completion.

pub mod breakdown;
pub mod config;
pub mod engine;
pub mod events;
pub mod host;
pub mod render;
pub mod schedule;
pub mod state;
pub mod target;
pub mod utils;

// Re-export commonly used types
pub use breakdown::{breakdown_from_seconds, compute_breakdown, Breakdown};
pub use config::Config;
pub use engine::{CountdownTimer, TimerOptions};
pub use events::{TimerEvent, TimerEventKind};
pub use host::{Clock, ManualClock, SuspendMonitor, SystemClock};
pub use schedule::ScheduleMode;
pub use state::{TimerPhase, TimerState};
pub use utils::signals::shutdown_signal;
