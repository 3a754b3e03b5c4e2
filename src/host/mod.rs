//! Host collaborators module
//!
//! The clock and the suspension state are owned by the host; the countdown
//! only queries them.

pub mod clock;
pub mod suspend;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub use suspend::{SuspendMonitor, SuspendState};
