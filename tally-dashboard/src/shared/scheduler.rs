//! Countdown-driven refresh scheduler.
//!
//! Ticks once per second, reports the remaining seconds and fires the refresh
//! callback when the countdown expires. The scheduler never sees the outcome
//! of a refresh; the countdown resets either way.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

const TICK_PERIOD: Duration = Duration::from_secs(1);

type CountdownCallback = Box<dyn Fn(u64) + Send + Sync>;
type RefreshCallback = Box<dyn Fn() + Send + Sync>;

struct Countdown {
    interval_secs: u64,
    remaining: Mutex<u64>,
    on_countdown: CountdownCallback,
    on_refresh: RefreshCallback,
}

impl Countdown {
    fn tick(&self) {
        let remaining = {
            let mut remaining = self.remaining.lock();
            *remaining = remaining.saturating_sub(1);
            *remaining
        };
        (self.on_countdown)(remaining);

        if remaining == 0 {
            debug!(interval_secs = self.interval_secs, "Countdown expired, refreshing");
            (self.on_refresh)();
            self.reset();
        }
    }

    fn reset(&self) {
        *self.remaining.lock() = self.interval_secs;
        (self.on_countdown)(self.interval_secs);
    }
}

/// Owns the countdown and the repeating one-second tick task
pub struct RefreshScheduler {
    countdown: Arc<Countdown>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    /// Create a stopped scheduler
    ///
    /// `on_countdown` receives the remaining seconds after every change;
    /// `on_refresh` fires when the countdown expires.
    pub fn new<C, R>(interval_secs: u64, on_countdown: C, on_refresh: R) -> Self
    where
        C: Fn(u64) + Send + Sync + 'static,
        R: Fn() + Send + Sync + 'static,
    {
        let interval_secs = interval_secs.max(1);
        Self {
            countdown: Arc::new(Countdown {
                interval_secs,
                remaining: Mutex::new(interval_secs),
                on_countdown: Box::new(on_countdown),
                on_refresh: Box::new(on_refresh),
            }),
            task: Mutex::new(None),
        }
    }

    /// Restart the countdown at the full interval and begin ticking
    ///
    /// Any previous tick task is aborted first.
    pub fn start(&self) {
        let mut task = self.task.lock();
        if let Some(previous) = task.take() {
            previous.abort();
        }

        self.countdown.reset();

        let countdown = Arc::clone(&self.countdown);
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                countdown.tick();
            }
        }));
    }

    /// Advance the countdown by one second
    pub fn tick(&self) {
        self.countdown.tick();
    }

    /// Jump back to the full interval without waiting for expiry
    pub fn reset(&self) {
        self.countdown.reset();
    }

    /// Stop ticking. In-flight refreshes are not affected
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            debug!("Refresh scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Seconds until the next scheduled refresh
    pub fn countdown(&self) -> u64 {
        *self.countdown.remaining.lock()
    }

    pub fn interval_secs(&self) -> u64 {
        self.countdown.interval_secs
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("interval_secs", &self.interval_secs())
            .field("countdown", &self.countdown())
            .field("running", &self.is_running())
            .finish()
    }
}
