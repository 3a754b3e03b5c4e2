//! Host suspension tracking
//!
//! The host (a signal handler, a power-management hook, a test) reports when
//! the process is suspended and when it comes back. Background scheduling
//! watches these reports to resync the countdown on resume.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Snapshot of the host's suspension state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SuspendState {
    /// Whether the host is currently suspended
    pub suspended: bool,
    /// Number of resumes observed so far
    pub resumes: u64,
}

/// Shared handle to the host's suspension state
#[derive(Debug, Clone)]
pub struct SuspendMonitor {
    tx: Arc<watch::Sender<SuspendState>>,
}

impl SuspendMonitor {
    /// Create a monitor for a host that is currently running
    pub fn new() -> Self {
        let (tx, _) = watch::channel(SuspendState::default());
        Self { tx: Arc::new(tx) }
    }

    /// Set the suspended state; leaving suspension counts as a resume
    pub fn set_suspended(&self, suspended: bool) {
        self.tx.send_if_modified(|state| {
            if state.suspended == suspended {
                return false;
            }
            state.suspended = suspended;
            if !suspended {
                state.resumes += 1;
            }
            true
        });
        info!("Host suspended state set to: {}", suspended);
    }

    /// Report a resume without a matching suspend report
    ///
    /// Hosts that only learn about suspension after the fact (SIGCONT, a
    /// wake-up hook) call this.
    pub fn notify_resumed(&self) {
        self.tx.send_modify(|state| {
            state.suspended = false;
            state.resumes += 1;
        });
        debug!("Host resume reported");
    }

    /// Check if the host is suspended
    pub fn is_suspended(&self) -> bool {
        self.tx.borrow().suspended
    }

    /// Current snapshot
    pub fn state(&self) -> SuspendState {
        *self.tx.borrow()
    }

    /// Watch for suspension changes
    pub fn subscribe(&self) -> watch::Receiver<SuspendState> {
        self.tx.subscribe()
    }
}

impl Default for SuspendMonitor {
    fn default() -> Self {
        Self::new()
    }
}
