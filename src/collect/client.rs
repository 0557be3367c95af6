// src/collect/client.rs
//! Outbound HTTP for collectors. One `reqwest::Client` per process, built with
//! an explicit per-request timeout. No retries here: the next scheduler tick
//! is the retry.

use std::time::Duration;

use async_trait::async_trait;
use metrics::histogram;

use crate::collect::types::{PageFetcher, RawPage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        // empty cookie etc. should not be sent at all
        if !value.is_empty() {
            self.headers.push((name, value));
        }
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
}

impl FetchError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Status { .. } => "status",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Transport { .. } => "transport",
        }
    }

    fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<RawPage, FetchError> {
        let t0 = std::time::Instant::now();

        let mut builder = self.client.get(&req.url);
        for (name, value) in &req.headers {
            builder = builder.header(*name, value);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&req.url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: req.url.clone(),
                status: status.as_u16(),
            });
        }

        let final_url = resp.url().to_string();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&req.url, e))?;

        histogram!("collect_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        tracing::debug!(url = %req.url, bytes = body.len(), "fetched page");

        Ok(RawPage::new(final_url, body))
    }
}
