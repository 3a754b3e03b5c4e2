//! Signal handling for shutdown and resume detection

use signal_hook_tokio::Signals;
use futures::stream::StreamExt;
use tracing::info;

use crate::host::SuspendMonitor;

/// Wait for shutdown signals (SIGTERM, SIGINT)
pub async fn shutdown_signal() -> std::io::Result<()> {
    let mut signals = Signals::new([
        signal_hook::consts::SIGTERM,
        signal_hook::consts::SIGINT,
    ])?;

    if let Some(signal) = signals.next().await {
        info!("Received signal: {}", signal);
    }
    Ok(())
}

/// Report every SIGCONT to `monitor` as a host resume
///
/// A process stopped with SIGTSTP or SIGSTOP cannot observe its own
/// suspension, only the SIGCONT that ends it.
pub async fn forward_resumes(monitor: SuspendMonitor) -> std::io::Result<()> {
    let mut signals = Signals::new([signal_hook::consts::SIGCONT])?;

    while let Some(signal) = signals.next().await {
        info!("Received signal: {}, process resumed", signal);
        monitor.notify_resumed();
    }
    Ok(())
}
