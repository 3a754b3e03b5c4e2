//! Countdown timer engine
//!
//! Owns the remaining-seconds counter, arms a [`Scheduler`] to decrement it,
//! and pushes the resulting breakdown to subscribers.
//!
//! Engine state lives behind one lock. Ticks carry the generation they were
//! armed with and are dropped if the engine has since been stopped, re-armed
//! or retargeted. A tick decides its outcome under the state lock and
//! delivers notifications after releasing it, holding a separate delivery
//! lock instead. `stop`, `set_target` and drop wait on that lock, so nothing
//! is delivered after [`CountdownTimer::stop`] returns, while callbacks stay
//! free to call back into the engine.

use std::{
    cell::Cell,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};
use chrono::{DateTime, SubsecRound, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::{
    breakdown::{breakdown_from_seconds, remaining_seconds, Breakdown},
    events::TimerEvent,
    host::{Clock, SuspendMonitor, SystemClock},
    schedule::{Schedule, ScheduleMode, Scheduler, TickFn, TickOutcome},
    state::{TimerPhase, TimerState},
    target::parse_target,
};

const EVENT_CAPACITY: usize = 64;

pub type ChangeCallback = Box<dyn Fn(u64) + Send + Sync>;
pub type FinishCallback = Box<dyn Fn() + Send + Sync>;

/// Caller-supplied countdown options
pub struct TimerOptions {
    /// Use background-capable scheduling when the host supports it
    pub background: bool,
    /// Start ticking as soon as a reachable target is set
    pub running: bool,
    pub on_change: Option<ChangeCallback>,
    pub on_finish: Option<FinishCallback>,
}

impl TimerOptions {
    pub fn background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    pub fn running(mut self, running: bool) -> Self {
        self.running = running;
        self
    }

    /// Called with the remaining seconds after every tick
    ///
    /// Callbacks run on the scheduling task with the engine state unlocked,
    /// so they may read the countdown or call `stop`, `set_running` and
    /// `set_target` on it. Those calls take effect immediately; the callback
    /// that made them is the last one delivered for the stopped arming.
    pub fn on_change(mut self, callback: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Called once when the countdown reaches zero
    pub fn on_finish(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_finish = Some(Box::new(callback));
        self
    }
}

impl Default for TimerOptions {
    fn default() -> Self {
        Self {
            background: false,
            running: true,
            on_change: None,
            on_finish: None,
        }
    }
}

struct Core {
    state: TimerState,
    breakdown: Breakdown,
    /// Bumped whenever outstanding ticks must be ignored
    generation: u64,
    auto_start: bool,
    breakdown_tx: watch::Sender<Breakdown>,
}

impl Core {
    fn publish_breakdown(&mut self, breakdown: Breakdown) {
        self.breakdown = breakdown;
        self.breakdown_tx.send_replace(breakdown);
    }
}

fn lock(core: &Mutex<Core>) -> MutexGuard<'_, Core> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

thread_local! {
    /// Address of the notifier whose callbacks this thread is running
    static DELIVERING: Cell<usize> = const { Cell::new(0) };
}

/// Callbacks and event channel, with the lock held while delivering them
struct Notifier {
    on_change: Option<ChangeCallback>,
    on_finish: Option<FinishCallback>,
    event_tx: broadcast::Sender<TimerEvent>,
    delivery: Mutex<()>,
}

impl Notifier {
    fn id(&self) -> usize {
        self as *const Notifier as usize
    }

    /// Wait for in-flight notifications and hold off new ones
    ///
    /// Returns `None` when called from one of this notifier's own callbacks,
    /// which already hold the delivery lock.
    fn quiesce(&self) -> Option<MutexGuard<'_, ()>> {
        if DELIVERING.with(|current| current.get()) == self.id() {
            return None;
        }
        Some(self.delivery.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn change(&self, remaining: u64, breakdown: Breakdown) {
        if let Some(callback) = &self.on_change {
            callback(remaining);
        }
        let _ = self.event_tx.send(TimerEvent::changed(remaining, breakdown));
    }

    fn finish(&self) {
        if let Some(callback) = &self.on_finish {
            callback();
        }
        let _ = self.event_tx.send(TimerEvent::finished());
    }
}

/// Marks the current thread as delivering for one notifier until dropped
struct DeliveryScope {
    previous: usize,
}

impl DeliveryScope {
    fn enter(notifier: &Notifier) -> Self {
        let previous = DELIVERING.with(|current| current.replace(notifier.id()));
        Self { previous }
    }
}

impl Drop for DeliveryScope {
    fn drop(&mut self) {
        DELIVERING.with(|current| current.set(self.previous));
    }
}

/// Countdown toward a target instant
pub struct CountdownTimer {
    core: Arc<Mutex<Core>>,
    notifier: Arc<Notifier>,
    scheduler: Mutex<Scheduler>,
    clock: Arc<dyn Clock>,
}

impl CountdownTimer {
    /// Create a countdown on the system clock
    ///
    /// No host suspension facility is attached, so background scheduling
    /// falls back to foreground ticks.
    pub fn new(options: TimerOptions) -> Self {
        Self::with_host(options, Arc::new(SystemClock), None)
    }

    /// Create a countdown against host-provided clock and suspension state
    pub fn with_host(
        options: TimerOptions,
        clock: Arc<dyn Clock>,
        monitor: Option<SuspendMonitor>,
    ) -> Self {
        let scheduler = Scheduler::select(options.background, monitor, Arc::clone(&clock));
        let background_capable = scheduler.mode() == ScheduleMode::Background;
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (breakdown_tx, _) = watch::channel(Breakdown::ZERO);

        let core = Core {
            state: TimerState::new(background_capable),
            breakdown: Breakdown::ZERO,
            generation: 0,
            auto_start: options.running,
            breakdown_tx,
        };
        let notifier = Notifier {
            on_change: options.on_change,
            on_finish: options.on_finish,
            event_tx,
            delivery: Mutex::new(()),
        };

        Self {
            core: Arc::new(Mutex::new(core)),
            notifier: Arc::new(notifier),
            scheduler: Mutex::new(scheduler),
            clock,
        }
    }

    fn lock_scheduler(&self) -> MutexGuard<'_, Scheduler> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Point the countdown at a new target
    ///
    /// Recomputes the remaining seconds and breakdown. A running countdown is
    /// re-armed with the new count; outstanding ticks from the previous
    /// arming are discarded. `None` resets to idle, and so does a target at
    /// or before now: the target is kept but the countdown has no time left,
    /// shows a zero breakdown and never starts or finishes.
    pub fn set_target(&self, target: Option<DateTime<Utc>>) -> TimerPhase {
        let _delivery = self.notifier.quiesce();
        let mut scheduler = self.lock_scheduler();
        let mut core = lock(&self.core);

        let was_running = core.state.is_running();
        core.generation += 1;
        scheduler.cancel();

        let Some(target) = target else {
            core.state.target = None;
            core.state.remaining_seconds = 0;
            core.state.phase = TimerPhase::Idle;
            core.publish_breakdown(Breakdown::ZERO);
            info!("Countdown target cleared");
            return core.state.phase;
        };

        let target = self.clock.localize(target);
        let now = self.clock.now().trunc_subsecs(0);
        let remaining = remaining_seconds(&target, &now);

        core.state.target = Some(target);
        core.state.remaining_seconds = remaining;
        core.publish_breakdown(breakdown_from_seconds(remaining, &target, &now));

        if remaining == 0 {
            core.state.phase = TimerPhase::Idle;
            info!("Countdown target {} already reached", target);
            return core.state.phase;
        }

        core.state.phase = TimerPhase::Initialized;
        info!("Countdown target set to {}, {} seconds remaining", target, remaining);

        if was_running || core.auto_start {
            self.arm(&mut scheduler, &mut core);
        }
        core.state.phase
    }

    /// Parse and set a target; unusable input resets the countdown to idle
    pub fn set_target_str(&self, raw: &str) -> TimerPhase {
        match parse_target(raw) {
            Ok(target) => self.set_target(Some(target)),
            Err(e) => {
                warn!("Ignoring countdown target: {}", e);
                self.set_target(None)
            }
        }
    }

    /// Start ticking from an initialized or stopped countdown
    ///
    /// Does nothing when there is no time left.
    pub fn start(&self) -> TimerPhase {
        let mut scheduler = self.lock_scheduler();
        let mut core = lock(&self.core);

        if !core.state.phase.can_start() {
            debug!("Countdown cannot start from {}", core.state.phase.as_str());
            return core.state.phase;
        }
        if core.state.remaining_seconds == 0 {
            debug!("Countdown has no time left, not starting");
            return core.state.phase;
        }

        self.arm(&mut scheduler, &mut core);
        core.state.phase
    }

    /// Stop ticking
    ///
    /// No tick or notification is delivered once this returns, except that
    /// a callback stopping its own countdown finishes running. Stopping an
    /// idle, finished or already stopped countdown does nothing.
    pub fn stop(&self) -> TimerPhase {
        let _delivery = self.notifier.quiesce();
        let mut scheduler = self.lock_scheduler();
        let mut core = lock(&self.core);

        if !matches!(core.state.phase, TimerPhase::Running | TimerPhase::Initialized) {
            return core.state.phase;
        }

        core.generation += 1;
        scheduler.cancel();
        core.state.phase = TimerPhase::Stopped;
        info!("Countdown stopped with {} seconds remaining", core.state.remaining_seconds);
        core.state.phase
    }

    /// Set the caller's running flag, starting or stopping accordingly
    pub fn set_running(&self, running: bool) -> TimerPhase {
        lock(&self.core).auto_start = running;
        if running {
            self.start()
        } else {
            self.stop()
        }
    }

    fn arm(&self, scheduler: &mut Scheduler, core: &mut Core) {
        core.generation += 1;
        let on_tick = tick_handler(
            Arc::downgrade(&self.core),
            Arc::clone(&self.notifier),
            Arc::clone(&self.clock),
            core.generation,
        );

        match scheduler.arm(core.state.remaining_seconds, on_tick) {
            Ok(()) => {
                core.state.phase = TimerPhase::Running;
                info!(
                    "Countdown running with {} seconds remaining ({:?} ticks)",
                    core.state.remaining_seconds,
                    scheduler.mode()
                );
            }
            Err(e) => warn!("Failed to arm countdown schedule: {}", e),
        }
    }

    pub fn phase(&self) -> TimerPhase {
        lock(&self.core).state.phase
    }

    pub fn remaining_seconds(&self) -> u64 {
        lock(&self.core).state.remaining_seconds
    }

    pub fn breakdown(&self) -> Breakdown {
        lock(&self.core).breakdown
    }

    pub fn state(&self) -> TimerState {
        lock(&self.core).state.clone()
    }

    /// Current count as a change event, for consumers that render events
    pub fn snapshot(&self) -> TimerEvent {
        let core = lock(&self.core);
        TimerEvent::changed(core.state.remaining_seconds, core.breakdown)
    }

    /// Whether background scheduling is in effect
    pub fn is_background_capable(&self) -> bool {
        lock(&self.core).state.background_capable
    }

    pub fn schedule_mode(&self) -> ScheduleMode {
        self.lock_scheduler().mode()
    }

    /// Receive change and finish events
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.notifier.event_tx.subscribe()
    }

    /// Watch the latest breakdown
    pub fn watch_breakdown(&self) -> watch::Receiver<Breakdown> {
        lock(&self.core).breakdown_tx.subscribe()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        let _delivery = self.notifier.quiesce();
        let mut scheduler = self.lock_scheduler();
        let mut core = lock(&self.core);
        core.generation += 1;
        scheduler.cancel();
    }
}

/// Build the tick callback for one arming of the schedule
fn tick_handler(
    core: Weak<Mutex<Core>>,
    notifier: Arc<Notifier>,
    clock: Arc<dyn Clock>,
    generation: u64,
) -> TickFn {
    Arc::new(move |elapsed| {
        let Some(core) = core.upgrade() else {
            return TickOutcome::Done;
        };
        let _delivery = notifier.delivery.lock().unwrap_or_else(PoisonError::into_inner);

        let (remaining, breakdown) = {
            let mut core = lock(&core);

            if core.generation != generation || !core.state.is_running() {
                debug!("Dropping stale countdown tick");
                return TickOutcome::Done;
            }
            let Some(target) = core.state.target else {
                return TickOutcome::Done;
            };
            if elapsed == 0 {
                return TickOutcome::Continue;
            }

            let remaining = core.state.remaining_seconds.saturating_sub(elapsed);
            core.state.remaining_seconds = remaining;
            core.publish_breakdown(breakdown_from_seconds(remaining, &target, &clock.now()));
            debug!("Countdown tick: -{}s, {} seconds remaining", elapsed, remaining);

            if remaining == 0 {
                core.state.phase = TimerPhase::Finished;
                info!("Countdown finished");
            }
            (remaining, core.breakdown)
        };

        let _scope = DeliveryScope::enter(&notifier);
        notifier.change(remaining, breakdown);

        // The change callback may have stopped or retargeted the countdown
        if lock(&core).generation != generation {
            return TickOutcome::Done;
        }
        if remaining == 0 {
            notifier.finish();
            return TickOutcome::Done;
        }
        TickOutcome::Continue
    })
}
