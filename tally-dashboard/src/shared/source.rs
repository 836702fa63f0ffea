//! Tally data sources: a simulated generator and a remote JSON endpoint.
//!
//! [`DataSourceKind::from_config`] picks exactly one. A usable endpoint always
//! wins over simulation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, info, warn};
use url::Url;

use super::config::DashboardConfig;
use super::error::DashboardError;
use super::types::{Candidate, TallyPayload};

/// Lowest simulated per-candidate delta
pub const SIMULATED_DELTA_MIN: i64 = -25;
/// Highest simulated per-candidate delta
pub const SIMULATED_DELTA_MAX: i64 = 24;

/// Somewhere a tally can be fetched from
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    async fn fetch(&self) -> Result<TallyPayload, DashboardError>;
}

/// The source selected by configuration
#[derive(Debug)]
pub enum DataSourceKind {
    Simulated(SimulatedSource),
    Remote(RemoteSource),
    /// Neither an endpoint nor simulation is available
    Unavailable,
}

impl DataSourceKind {
    pub fn from_config(config: &DashboardConfig) -> Self {
        if let Some(url) = config.endpoint() {
            info!(endpoint = %url, "Using remote tally source");
            return Self::Remote(RemoteSource::new(url, config.fetch_timeout));
        }

        if config.use_simulated_data {
            info!(
                delay_ms = config.simulated_delay.as_millis() as u64,
                "Using simulated tally source"
            );
            return Self::Simulated(SimulatedSource::new().with_delay(config.simulated_delay));
        }

        warn!("No endpoint configured and simulation disabled");
        Self::Unavailable
    }

    /// Short name for logs and the status bar
    pub fn name(&self) -> &'static str {
        match self {
            DataSourceKind::Simulated(_) => "simulated",
            DataSourceKind::Remote(_) => "remote",
            DataSourceKind::Unavailable => "unavailable",
        }
    }
}

#[async_trait]
impl DataSource for DataSourceKind {
    async fn fetch(&self) -> Result<TallyPayload, DashboardError> {
        match self {
            DataSourceKind::Simulated(source) => source.fetch().await,
            DataSourceKind::Remote(source) => source.fetch().await,
            DataSourceKind::Unavailable => Err(DashboardError::Configuration(
                "no data source available".to_string(),
            )),
        }
    }
}

/// Generates a randomly perturbed copy of a fixed baseline tally
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    baseline: TallyPayload,
    delay: Duration,
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSource {
    /// Simulated source over the demo tally with a one second delay
    pub fn new() -> Self {
        Self {
            baseline: demo_tally(),
            delay: Duration::from_secs(1),
        }
    }

    pub fn with_baseline(mut self, baseline: TallyPayload) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn baseline(&self) -> &TallyPayload {
        &self.baseline
    }
}

#[async_trait]
impl DataSource for SimulatedSource {
    async fn fetch(&self) -> Result<TallyPayload, DashboardError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let payload = perturb(&self.baseline, &mut rand::rng(), Utc::now());
        debug!(candidates = payload.candidates.len(), "Generated simulated tally");
        Ok(payload)
    }
}

/// Copy `baseline`, nudging every vote count by a delta in
/// [`SIMULATED_DELTA_MIN`, `SIMULATED_DELTA_MAX`] and clamping at zero
pub fn perturb<R: Rng + ?Sized>(
    baseline: &TallyPayload,
    rng: &mut R,
    now: DateTime<Utc>,
) -> TallyPayload {
    let mut payload = baseline.clone();

    for candidate in payload.candidates.iter_mut() {
        let delta = rng.random_range(SIMULATED_DELTA_MIN..=SIMULATED_DELTA_MAX);
        candidate.votes = (candidate.votes as i64).saturating_add(delta).max(0) as u64;
    }

    payload.last_updated = now;
    payload
}

/// Demo tally used as the simulation baseline
pub fn demo_tally() -> TallyPayload {
    TallyPayload {
        last_updated: Utc::now(),
        total_votes: 1245,
        candidates: vec![
            Candidate::new(1, "Opción A", 450).with_color("#667eea"),
            Candidate::new(2, "Opción B", 380).with_color("#4CAF50"),
            Candidate::new(3, "Opción C", 285).with_color("#FF9800"),
            Candidate::new(4, "Opción D", 130).with_color("#F44336"),
        ],
    }
}

/// Fetches the tally from an HTTP endpoint returning JSON
#[derive(Debug, Clone)]
pub struct RemoteSource {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl RemoteSource {
    pub fn new(url: Url, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            timeout,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn request_error(&self, error: reqwest::Error) -> DashboardError {
        if error.is_timeout() {
            DashboardError::Timeout {
                millis: self.timeout.as_millis() as u64,
            }
        } else {
            DashboardError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl DataSource for RemoteSource {
    async fn fetch(&self) -> Result<TallyPayload, DashboardError> {
        let response = self
            .client
            .get(self.url.clone())
            .timeout(self.timeout)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.request_error(e))?;
        let payload: TallyPayload = serde_json::from_slice(&body)?;

        debug!(
            url = %self.url,
            candidates = payload.candidates.len(),
            "Fetched remote tally"
        );
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::testing::{closed_port, http_response, serve_once, serve_silently};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_perturb_stays_within_bounds() {
        let baseline = demo_tally();
        let mut rng = StdRng::seed_from_u64(7);
        let now = Utc::now();

        for _ in 0..500 {
            let payload = perturb(&baseline, &mut rng, now);
            assert_eq!(payload.candidates.len(), baseline.candidates.len());
            assert_eq!(payload.last_updated, now);

            for (got, base) in payload.candidates.iter().zip(&baseline.candidates) {
                let delta = got.votes as i64 - base.votes as i64;
                assert!((SIMULATED_DELTA_MIN..=SIMULATED_DELTA_MAX).contains(&delta));
                assert_eq!(got.id, base.id);
                assert_eq!(got.color, base.color);
            }
        }
    }

    #[test]
    fn test_perturb_clamps_at_zero() {
        let baseline = TallyPayload {
            last_updated: Utc::now(),
            total_votes: 0,
            candidates: vec![Candidate::new(1, "A", 0), Candidate::new(2, "B", 3)],
        };
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let payload = perturb(&baseline, &mut rng, Utc::now());
            assert!(payload.candidates[0].votes <= SIMULATED_DELTA_MAX as u64);
            assert!(payload.candidates[1].votes <= 3 + SIMULATED_DELTA_MAX as u64);
        }
    }

    #[test]
    fn test_perturb_leaves_baseline_untouched() {
        let baseline = demo_tally();
        let before = baseline.clone();
        let _ = perturb(&baseline, &mut StdRng::seed_from_u64(1), Utc::now());
        assert_eq!(baseline, before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_source_waits_for_delay() {
        let source = SimulatedSource::new().with_delay(Duration::from_secs(1));
        let started = tokio::time::Instant::now();

        let payload = source.fetch().await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(payload.candidates.len(), 4);
    }

    #[test]
    fn test_source_selection() {
        struct TestCase {
            config: DashboardConfig,
            expected: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0: default config simulates
                config: DashboardConfig::default(),
                expected: "simulated",
            },
            TestCase {
                // TC1: endpoint wins over simulation
                config: DashboardConfig::new("http://127.0.0.1:9/tally").with_simulated_data(true),
                expected: "remote",
            },
            TestCase {
                // TC2: endpoint without simulation
                config: DashboardConfig::new("http://127.0.0.1:9/tally").with_simulated_data(false),
                expected: "remote",
            },
            TestCase {
                // TC3: nothing usable
                config: DashboardConfig::default().with_simulated_data(false),
                expected: "unavailable",
            },
            TestCase {
                // TC4: unparsable endpoint falls back to simulation
                config: DashboardConfig::new("::nope::"),
                expected: "simulated",
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = DataSourceKind::from_config(&test.config).name();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[tokio::test]
    async fn test_unavailable_source_fails_with_configuration_error() {
        let config = DashboardConfig::default().with_simulated_data(false);
        let source = DataSourceKind::from_config(&config);
        let err = source.fetch().await.unwrap_err();
        assert_eq!(
            err,
            DashboardError::Configuration("no data source available".to_string())
        );
    }

    #[tokio::test]
    async fn test_remote_source_parses_payload() {
        let body = r##"{
            "ultimaActualizacion": "2024-06-02T18:30:00Z",
            "totalVotos": 5,
            "candidatos": [
                {"id": 1, "nombre": "A", "votos": 3},
                {"id": 2, "nombre": "B", "votos": 2, "color": "#fff000"}
            ]
        }"##;
        let url = serve_once(http_response("200 OK", body)).await;

        let payload = RemoteSource::new(url, Duration::from_secs(5)).fetch().await.unwrap();

        assert_eq!(payload.candidates.len(), 2);
        assert_eq!(payload.candidates[1].color.as_deref(), Some("#fff000"));
    }

    #[tokio::test]
    async fn test_remote_source_http_error() {
        let url = serve_once(http_response("500 Internal Server Error", "")).await;

        let err = RemoteSource::new(url, Duration::from_secs(5)).fetch().await.unwrap_err();

        assert_eq!(err, DashboardError::Http { status: 500 });
    }

    #[tokio::test]
    async fn test_remote_source_parse_error() {
        let url = serve_once(http_response("200 OK", r#"{"candidatos": "nope"}"#)).await;

        let err = RemoteSource::new(url, Duration::from_secs(5)).fetch().await.unwrap_err();

        assert!(matches!(err, DashboardError::Parse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_remote_source_times_out() {
        let url = serve_silently().await;

        let err = RemoteSource::new(url, Duration::from_millis(200))
            .fetch()
            .await
            .unwrap_err();

        assert_eq!(err, DashboardError::Timeout { millis: 200 });
    }

    #[tokio::test]
    async fn test_remote_source_connection_refused() {
        let url = closed_port().await;

        let err = RemoteSource::new(url, Duration::from_secs(5))
            .fetch()
            .await
            .unwrap_err();

        assert!(matches!(err, DashboardError::Transport(_)), "got {err:?}");
        assert!(err.is_remote());
    }
}
