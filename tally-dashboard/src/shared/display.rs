//! Display surface abstraction and the in-memory view the terminal draws from.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::error;

use super::error::DashboardError;
use super::status::ConnectionState;
use super::types::{RankedCandidate, ViewModel};

/// Render target for the controller
///
/// Implementations must be cheap and must not block: they are called from
/// poll tasks and the scheduler tick.
pub trait DisplaySurface: Send + Sync + 'static {
    /// Show the loading placeholder
    fn render_loading(&self);

    /// Show the error placeholder with a retry hint
    fn render_error(&self, message: &str);

    /// Show the explicit "no data" placeholder for an empty tally
    fn render_no_data(&self);

    /// Show ranked results
    fn render_results(&self, view: &ViewModel, last_updated_label: &str, total_votes: u128);

    /// Update the status indicator
    fn render_status(&self, state: ConnectionState, label: &str);

    /// Update the countdown display
    fn render_countdown(&self, seconds_remaining: u64);
}

/// What the results panel currently shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Loading,
    Error(String),
    NoData,
    Results(Vec<RankedCandidate>),
}

/// Everything the terminal needs to draw one frame
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewState {
    pub panel: Panel,
    pub status: ConnectionState,
    pub status_label: String,
    pub countdown: u64,
    pub last_updated: Option<String>,
    pub total_votes: Option<u128>,
    /// Incremented on every panel render
    pub panel_renders: u64,
}

/// Thread-safe [`DisplaySurface`] holding the latest [`ViewState`]
#[derive(Debug, Clone, Default)]
pub struct SharedView {
    state: Arc<Mutex<ViewState>>,
}

impl SharedView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state for drawing
    pub fn snapshot(&self) -> ViewState {
        self.state.lock().clone()
    }

    /// Run one UI step, turning a panic into the internal-error placeholder
    ///
    /// Returns `None` if `step` panicked.
    pub fn run_guarded<T>(&self, step: impl FnOnce() -> T) -> Option<T> {
        match std::panic::catch_unwind(AssertUnwindSafe(step)) {
            Ok(value) => Some(value),
            Err(panic) => {
                let error = DashboardError::from_panic(panic.as_ref());
                error!(%error, "UI step panicked");
                self.render_error(&error.user_message());
                self.render_status(ConnectionState::Error, ConnectionState::Error.label());
                None
            }
        }
    }

    fn set_panel(&self, panel: Panel) {
        let mut state = self.state.lock();
        state.panel = panel;
        state.panel_renders += 1;
    }
}

impl DisplaySurface for SharedView {
    fn render_loading(&self) {
        self.set_panel(Panel::Loading);
    }

    fn render_error(&self, message: &str) {
        self.set_panel(Panel::Error(message.to_string()));
    }

    fn render_no_data(&self) {
        self.set_panel(Panel::NoData);
    }

    fn render_results(&self, view: &ViewModel, last_updated_label: &str, total_votes: u128) {
        let mut state = self.state.lock();
        state.panel = Panel::Results(view.candidates.clone());
        state.panel_renders += 1;
        state.last_updated = Some(last_updated_label.to_string());
        state.total_votes = Some(total_votes);
    }

    fn render_status(&self, status: ConnectionState, label: &str) {
        let mut state = self.state.lock();
        state.status = status;
        state.status_label = label.to_string();
    }

    fn render_countdown(&self, seconds_remaining: u64) {
        self.state.lock().countdown = seconds_remaining;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::normalize::normalize;
    use crate::shared::testing::tally;

    #[test]
    fn test_shared_view_tracks_latest_render() {
        let view = SharedView::new();
        let other_handle = view.clone();

        view.render_loading();
        view.render_error("HTTP error 500");
        assert_eq!(other_handle.snapshot().panel, Panel::Error("HTTP error 500".to_string()));

        let model = normalize(&tally(&[("A", 3), ("B", 1)]));
        view.render_results(&model, "18:30:00", model.total_votes);

        let state = other_handle.snapshot();
        assert!(matches!(&state.panel, Panel::Results(c) if c.len() == 2));
        assert_eq!(state.last_updated.as_deref(), Some("18:30:00"));
        assert_eq!(state.total_votes, Some(4));
        assert_eq!(state.panel_renders, 3);
    }

    #[test]
    fn test_status_and_countdown_do_not_touch_panel() {
        let view = SharedView::new();
        view.render_no_data();
        view.render_status(ConnectionState::Connected, "Connected");
        view.render_countdown(12);

        let state = view.snapshot();
        assert_eq!(state.panel, Panel::NoData);
        assert_eq!(state.status, ConnectionState::Connected);
        assert_eq!(state.status_label, "Connected");
        assert_eq!(state.countdown, 12);
        assert_eq!(state.panel_renders, 1);
    }

    #[test]
    fn test_run_guarded_turns_panic_into_internal_error() {
        let view = SharedView::new();
        view.render_status(ConnectionState::Connected, "Connected");

        assert_eq!(view.run_guarded(|| 7), Some(7));
        assert_eq!(view.snapshot().panel, Panel::Loading);

        let outcome: Option<()> = view.run_guarded(|| panic!("index out of bounds"));

        assert_eq!(outcome, None);
        let state = view.snapshot();
        assert_eq!(state.panel, Panel::Error("Internal application error".to_string()));
        assert_eq!(state.status, ConnectionState::Error);
        assert_eq!(state.status_label, "Connection error");
    }
}
