//! Test helpers: throwaway HTTP responders and scripted data sources.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

use super::error::DashboardError;
use super::source::DataSource;
use super::types::{Candidate, TallyPayload};

/// Build a minimal HTTP/1.1 response
pub fn http_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status_line}\r\n\
         content-type: application/json\r\n\
         content-length: {}\r\n\
         connection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Serve `response` to the first connection, then stop listening
pub async fn serve_once(response: String) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    Url::parse(&format!("http://{addr}/tally")).unwrap()
}

/// Accept a connection and never answer it
pub async fn serve_silently() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((socket, _)) = listener.accept().await {
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        }
    });

    Url::parse(&format!("http://{addr}/tally")).unwrap()
}

/// Url of a local port nothing listens on
pub async fn closed_port() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    Url::parse(&format!("http://{addr}/tally")).unwrap()
}

pub fn tally(votes: &[(&str, u64)]) -> TallyPayload {
    TallyPayload {
        last_updated: Utc.with_ymd_and_hms(2024, 6, 2, 18, 30, 0).unwrap(),
        total_votes: 0,
        candidates: votes
            .iter()
            .enumerate()
            .map(|(i, (name, v))| Candidate::new(i as u64 + 1, *name, *v))
            .collect(),
    }
}

/// Data source replaying scripted results, repeating the last one
pub struct ScriptedSource {
    results: Mutex<VecDeque<Result<TallyPayload, DashboardError>>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(results: Vec<Result<TallyPayload, DashboardError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    async fn fetch(&self) -> Result<TallyPayload, DashboardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = {
            let mut results = self.results.lock();
            if results.len() > 1 {
                results.pop_front()
            } else {
                results.front().cloned()
            }
        };

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        result.unwrap_or_else(|| {
            Err(DashboardError::Configuration("script exhausted".to_string()))
        })
    }
}
