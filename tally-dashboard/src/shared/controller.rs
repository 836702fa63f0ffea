//! Dashboard controller: runs polls and keeps the display surface current.
//!
//! A poll sets the status to loading, shows the loading placeholder, awaits
//! the data source, then renders results (or the error placeholder) and
//! settles the status. Every poll-path failure, panics included, ends at this
//! boundary as an error render.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::{DashboardConfig, OverlapPolicy};
use super::display::DisplaySurface;
use super::error::DashboardError;
use super::normalize::normalize;
use super::scheduler::RefreshScheduler;
use super::source::DataSource;
use super::status::{ConnectionState, StatusEvent, StatusTracker};

/// Result of one poll attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Results rendered
    Rendered { candidates: usize, total_votes: u128 },
    /// Tally had no candidates; the no-data placeholder was rendered
    NoData,
    /// Error placeholder rendered
    Failed(DashboardError),
    /// Another poll was in flight and the overlap policy skips
    Skipped,
}

/// Drives polls against a [`DataSource`] and renders onto a [`DisplaySurface`]
///
/// Cloning yields another handle to the same dashboard.
pub struct DashboardController<D, S> {
    inner: Arc<Inner<D, S>>,
}

impl<D, S> Clone for DashboardController<D, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<D, S> {
    source: D,
    surface: S,
    status: StatusTracker,
    scheduler: RefreshScheduler,
    overlap_policy: OverlapPolicy,
    in_flight: AtomicBool,
}

impl<D, S> DashboardController<D, S>
where
    D: DataSource,
    S: DisplaySurface,
{
    pub fn new(config: &DashboardConfig, source: D, surface: S) -> Self {
        let interval_secs = config.interval_secs();
        let overlap_policy = config.overlap_policy;

        let inner = Arc::new_cyclic(|weak: &Weak<Inner<D, S>>| {
            let countdown_target = weak.clone();
            let refresh_target = weak.clone();

            let scheduler = RefreshScheduler::new(
                interval_secs,
                move |secs| {
                    if let Some(inner) = countdown_target.upgrade() {
                        inner.surface.render_countdown(secs);
                    }
                },
                move || {
                    if let Some(inner) = refresh_target.upgrade() {
                        Inner::spawn_poll(&inner);
                    }
                },
            );

            Inner {
                source,
                surface,
                status: StatusTracker::new(),
                scheduler,
                overlap_policy,
                in_flight: AtomicBool::new(false),
            }
        });

        Self { inner }
    }

    /// Start the countdown and kick off the first poll immediately
    pub fn start(&self) -> JoinHandle<PollOutcome> {
        info!(
            interval_secs = self.inner.scheduler.interval_secs(),
            policy = ?self.inner.overlap_policy,
            "Starting dashboard"
        );
        self.inner.scheduler.start();
        Inner::spawn_poll(&self.inner)
    }

    /// Reset the countdown and poll now, alongside any poll already running
    pub fn manual_refresh(&self) -> JoinHandle<PollOutcome> {
        info!("Manual refresh requested");
        self.inner.scheduler.reset();
        Inner::spawn_poll(&self.inner)
    }

    /// Run one poll attempt to completion
    pub async fn poll(&self) -> PollOutcome {
        self.inner.poll().await
    }

    /// Stop scheduled polls. A poll already in flight still completes
    pub fn stop(&self) {
        self.inner.scheduler.stop();
    }

    pub fn status(&self) -> ConnectionState {
        self.inner.status.current()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionState> {
        self.inner.status.subscribe()
    }

    /// Seconds until the next scheduled poll
    pub fn countdown(&self) -> u64 {
        self.inner.scheduler.countdown()
    }

    pub fn is_running(&self) -> bool {
        self.inner.scheduler.is_running()
    }

    pub fn source(&self) -> &D {
        &self.inner.source
    }

    pub fn surface(&self) -> &S {
        &self.inner.surface
    }
}

impl<D, S> Inner<D, S>
where
    D: DataSource,
    S: DisplaySurface,
{
    fn spawn_poll(this: &Arc<Self>) -> JoinHandle<PollOutcome> {
        let inner = Arc::clone(this);
        tokio::spawn(async move { inner.poll().await })
    }

    async fn poll(&self) -> PollOutcome {
        let _guard = match self.overlap_policy {
            OverlapPolicy::Allow => None,
            OverlapPolicy::SkipWhileInFlight => match InFlightGuard::acquire(&self.in_flight) {
                Some(guard) => Some(guard),
                None => {
                    debug!("Poll already in flight, skipping");
                    return PollOutcome::Skipped;
                }
            },
        };

        match AssertUnwindSafe(self.run_poll()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let error = DashboardError::from_panic(panic.as_ref());
                error!(%error, "Poll panicked");
                self.fail(error)
            }
        }
    }

    async fn run_poll(&self) -> PollOutcome {
        self.transition(StatusEvent::PollStarted);
        self.surface.render_loading();

        let payload = match self.source.fetch().await {
            Ok(payload) => payload,
            Err(e) => return self.fail(e),
        };

        let view = normalize(&payload);
        if view.is_empty() {
            self.surface.render_no_data();
            self.transition(StatusEvent::PollSucceeded);
            info!("Poll returned no candidates");
            return PollOutcome::NoData;
        }

        self.surface
            .render_results(&view, &view.last_updated_label(), view.total_votes);
        self.transition(StatusEvent::PollSucceeded);

        info!(
            candidates = view.candidates.len(),
            total_votes = view.total_votes,
            leader = %view.candidates[0].name,
            "Poll rendered"
        );
        PollOutcome::Rendered {
            candidates: view.candidates.len(),
            total_votes: view.total_votes,
        }
    }

    fn fail(&self, error: DashboardError) -> PollOutcome {
        if error.is_remote() {
            warn!(%error, "Poll failed");
        } else {
            error!(%error, "Poll failed");
        }

        self.surface.render_error(&error.user_message());
        self.transition(StatusEvent::PollFailed);
        PollOutcome::Failed(error)
    }

    fn transition(&self, event: StatusEvent) {
        let state = self.status.apply(event);
        self.surface.render_status(state, state.label());
    }
}

/// Clears the in-flight flag when the poll ends, unwinding included
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
