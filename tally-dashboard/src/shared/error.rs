use std::any::Any;

use thiserror::Error;

/// All errors generated while polling and rendering a tally.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum DashboardError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("HTTP error {status}")]
    Http { status: u16 },

    #[error("invalid tally payload: {0}")]
    Parse(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out after {millis} ms")]
    Timeout { millis: u64 },

    #[error("internal application error: {0}")]
    InternalRender(String),
}

impl DashboardError {
    /// Message shown in the error placeholder
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::InternalRender(_) => "Internal application error".to_string(),
            other => other.to_string(),
        }
    }

    /// Determine if the error came from the configured endpoint rather than local setup.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_remote(&self) -> bool {
        match self {
            DashboardError::Http { .. }
            | DashboardError::Parse(_)
            | DashboardError::Transport(_)
            | DashboardError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Wrap a caught panic payload as a [`DashboardError::InternalRender`]
    pub fn from_panic(panic: &(dyn Any + Send)) -> Self {
        let reason = if let Some(msg) = panic.downcast_ref::<&str>() {
            msg.to_string()
        } else if let Some(msg) = panic.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::InternalRender(reason)
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value.to_string())
    }
}
