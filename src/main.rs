//! Until - count down to a moment in time
//!
//! Renders a countdown engine's events to the terminal.

use std::{io::Write, sync::Arc};
use chrono::Utc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use until::{
    config::Config,
    engine::{CountdownTimer, TimerOptions},
    events::{TimerEvent, TimerEventKind},
    host::{SuspendMonitor, SystemClock},
    render::{render_text, DisplayOptions},
    state::TimerPhase,
    utils::{forward_resumes, shutdown_signal},
    Breakdown,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr, stdout is the countdown itself
    tracing_subscriber::fmt()
        .with_env_filter(format!("until={}", config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting until v1.0.0");
    let target = config.target(Utc::now())?;
    info!("Configuration: target={}, background={}", target, config.background);

    let monitor = SuspendMonitor::new();
    let resume_monitor = monitor.clone();
    tokio::spawn(async move {
        if let Err(e) = forward_resumes(resume_monitor).await {
            warn!("Resume detection unavailable: {}", e);
        }
    });

    let timer = CountdownTimer::with_host(
        TimerOptions::default().background(config.background),
        Arc::new(SystemClock),
        Some(monitor),
    );
    let mut events = timer.subscribe();
    let display = config.display_options();

    timer.set_target(Some(target));
    info!("Counting down with {:?} ticks", timer.schedule_mode());
    print_event(&config, &display, &timer.snapshot())?;

    if timer.breakdown().is_zero() || timer.phase() != TimerPhase::Running {
        info!("Nothing to count down");
        print_finished(&config)?;
        return Ok(());
    }

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    print_event(&config, &display, &event)?;
                    if event.is_finished() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Renderer fell behind, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            result = &mut shutdown => {
                if let Err(e) = result {
                    warn!("Failed to listen for shutdown signals: {}", e);
                }
                timer.stop();
                println!();
                info!("Countdown interrupted with {} seconds remaining", timer.remaining_seconds());
                break;
            }
        }
    }

    Ok(())
}

fn print_breakdown(display: &DisplayOptions, breakdown: &Breakdown) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    write!(stdout, "\r{}", render_text(breakdown, display))?;
    stdout.flush()?;
    Ok(())
}

/// Every line in JSON mode is one serialized event
fn print_event(config: &Config, display: &DisplayOptions, event: &TimerEvent) -> anyhow::Result<()> {
    if config.json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match &event.kind {
        TimerEventKind::Changed { breakdown, .. } => print_breakdown(display, breakdown),
        TimerEventKind::Finished => print_finished(config),
    }
}

fn print_finished(config: &Config) -> anyhow::Result<()> {
    if !config.json {
        println!();
        println!("Time's up");
    }
    Ok(())
}
