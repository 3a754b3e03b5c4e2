//! State management module
//!
//! This module contains the countdown's state and lifecycle phases.

pub mod timer_state;

// Re-export main types
pub use timer_state::{TimerPhase, TimerState};
