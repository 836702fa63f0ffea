/// Dashboard configuration
///
/// Built from defaults, builder setters or environment variables.

use std::time::Duration;

use tracing::warn;
use url::Url;

/// What to do when a poll is requested while another is still in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Run every poll; the last one to finish wins the display
    #[default]
    Allow,
    /// Ignore poll requests while one is outstanding
    SkipWhileInFlight,
}

impl OverlapPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "allow" => Some(Self::Allow),
            "skip" | "skip_while_in_flight" => Some(Self::SkipWhileInFlight),
            _ => None,
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Time between scheduled polls
    pub refresh_interval: Duration,
    /// Fall back to generated tallies when no endpoint is set
    pub use_simulated_data: bool,
    /// Remote tally endpoint; empty means none
    pub endpoint_url: String,
    /// Upper bound on a remote fetch
    pub fetch_timeout: Duration,
    /// Artificial latency of the simulated source
    pub simulated_delay: Duration,
    /// Behaviour for overlapping manual and scheduled polls
    pub overlap_policy: OverlapPolicy,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(30_000),
            use_simulated_data: true,
            endpoint_url: String::new(),
            fetch_timeout: Duration::from_millis(10_000),
            simulated_delay: Duration::from_millis(1_000),
            overlap_policy: OverlapPolicy::Allow,
        }
    }
}

impl DashboardConfig {
    /// Create a configuration polling the given endpoint
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            ..Default::default()
        }
    }

    /// Read configuration from environment variables, falling back to defaults
    ///
    /// `REFRESH_INTERVAL_MS`, `USE_SIMULATED_DATA`, `ENDPOINT_URL`,
    /// `FETCH_TIMEOUT_MS`, `SIMULATED_DELAY_MS`, `OVERLAP_POLICY`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            refresh_interval: env_millis("REFRESH_INTERVAL_MS")
                .unwrap_or(defaults.refresh_interval),
            use_simulated_data: env_parse("USE_SIMULATED_DATA")
                .unwrap_or(defaults.use_simulated_data),
            endpoint_url: std::env::var("ENDPOINT_URL").unwrap_or(defaults.endpoint_url),
            fetch_timeout: env_millis("FETCH_TIMEOUT_MS").unwrap_or(defaults.fetch_timeout),
            simulated_delay: env_millis("SIMULATED_DELAY_MS").unwrap_or(defaults.simulated_delay),
            overlap_policy: std::env::var("OVERLAP_POLICY")
                .ok()
                .and_then(|v| OverlapPolicy::parse(&v))
                .unwrap_or(defaults.overlap_policy),
        }
    }

    /// Set the refresh interval
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Enable or disable simulated data
    pub fn with_simulated_data(mut self, enabled: bool) -> Self {
        self.use_simulated_data = enabled;
        self
    }

    /// Set the remote endpoint
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = url.into();
        self
    }

    /// Set the remote fetch timeout
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the simulated source latency
    pub fn with_simulated_delay(mut self, delay: Duration) -> Self {
        self.simulated_delay = delay;
        self
    }

    /// Set the overlap policy
    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }

    /// Countdown length in whole seconds (at least one)
    pub fn interval_secs(&self) -> u64 {
        self.refresh_interval.as_secs().max(1)
    }

    /// The endpoint, if one is set and parses as a URL
    pub fn endpoint(&self) -> Option<Url> {
        let raw = self.endpoint_url.trim();
        if raw.is_empty() {
            return None;
        }

        match Url::parse(raw) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(endpoint = raw, error = %e, "Ignoring unparsable endpoint URL");
                None
            }
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_millis(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).map(Duration::from_millis)
}
