/// Tally Dashboard - Shared Library
///
/// This library provides the refresh/render cycle behind the `tally-dashboard`
/// terminal binary:
/// - Tally types matching the JSON payload served by a tally endpoint
/// - Normalization of raw vote counts into a ranked, percentage-annotated view
/// - Simulated and remote data sources
/// - A countdown scheduler, a connection status machine and the controller
///   that wires them to a display surface
pub mod shared;

// Re-export commonly used types for convenience
pub use shared::types::{Candidate, RankedCandidate, TallyPayload, ViewModel};

pub use shared::config::{DashboardConfig, OverlapPolicy};
pub use shared::error::DashboardError;
pub use shared::normalize::{format_votes, normalize};
pub use shared::source::{DataSource, DataSourceKind, RemoteSource, SimulatedSource};

pub use shared::controller::{DashboardController, PollOutcome};
pub use shared::display::{DisplaySurface, Panel, SharedView, ViewState};
pub use shared::scheduler::RefreshScheduler;
pub use shared::status::{ConnectionState, StatusEvent, StatusTracker};
pub use shared::widget::render_dashboard;
