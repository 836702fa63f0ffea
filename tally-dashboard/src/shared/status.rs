/// Connection status state machine
///
/// Every poll passes through `Loading` and ends in `Connected` or `Error`.

use tokio::sync::watch;
use tracing::debug;

/// Connection status of the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No poll has started yet
    #[default]
    Idle,
    Loading,
    Connected,
    Error,
}

/// Poll lifecycle events driving the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    PollStarted,
    PollSucceeded,
    PollFailed,
}

impl ConnectionState {
    /// Apply an event
    ///
    /// Completions are ignored while `Idle`. A completion arriving after an
    /// overlapping poll already completed still applies: last one wins.
    pub fn next(self, event: StatusEvent) -> Self {
        match (self, event) {
            (_, StatusEvent::PollStarted) => ConnectionState::Loading,
            (ConnectionState::Idle, _) => ConnectionState::Idle,
            (_, StatusEvent::PollSucceeded) => ConnectionState::Connected,
            (_, StatusEvent::PollFailed) => ConnectionState::Error,
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "Waiting...",
            ConnectionState::Loading => "Loading...",
            ConnectionState::Connected => "Connected",
            ConnectionState::Error => "Connection error",
        }
    }

    /// Icon hint for the status indicator
    pub fn icon(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "○",
            ConnectionState::Loading => "◐",
            ConnectionState::Connected => "●",
            ConnectionState::Error => "✖",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Owns the current [`ConnectionState`] and publishes changes
#[derive(Debug)]
pub struct StatusTracker {
    tx: watch::Sender<ConnectionState>,
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ConnectionState::Idle);
        Self { tx }
    }

    pub fn current(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    /// Receiver observing every state change
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }

    /// Apply `event` and return the resulting state
    pub fn apply(&self, event: StatusEvent) -> ConnectionState {
        let mut next = ConnectionState::Idle;
        self.tx.send_modify(|state| {
            let prev = *state;
            *state = prev.next(event);
            next = *state;
            if prev != next {
                debug!(from = ?prev, to = ?next, ?event, "Connection status changed");
            }
        });
        next
    }
}
