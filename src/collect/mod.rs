// src/collect/mod.rs
pub mod client;
pub mod extract;
pub mod scheduler;
pub mod sources;
pub mod types;

use std::sync::Arc;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

use crate::collect::client::FetchError;
use crate::collect::types::{PageFetcher, Source, TopicRecord};
use crate::config::{AppConfig, SourceConfig};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("collect_records_total", "Records extracted per source.");
        describe_counter!(
            "collect_errors_total",
            "Collector failures by source and kind."
        );
        describe_histogram!("collect_fetch_ms", "Page fetch time in milliseconds.");
        describe_counter!("cycles_total", "Collection cycles that ran.");
        describe_counter!(
            "cycles_skipped_total",
            "Timer firings dropped because a cycle was still running."
        );
        describe_counter!("store_errors_total", "Failed snapshot replacements.");
        describe_gauge!("cycle_last_run_ts", "Unix ts when the last cycle finished.");
    });
}

/// Collapse whitespace runs and trim.
pub fn normalize_text(s: &str) -> String {
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    re_ws.replace_all(s, " ").trim().to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("credential rejected: {0}")]
    CredentialInvalid(String),
}

impl CollectError {
    pub fn kind(&self) -> &'static str {
        match self {
            CollectError::Fetch(e) => e.kind(),
            CollectError::CredentialInvalid(_) => "credential",
        }
    }
}

/// Fetch + extract for a single source.
#[derive(Clone)]
pub struct Collector {
    source: Source,
    fetcher: Arc<dyn PageFetcher>,
    cfg: SourceConfig,
    user_agent: String,
}

impl Collector {
    pub fn new(source: Source, fetcher: Arc<dyn PageFetcher>, app: &AppConfig) -> Self {
        Self {
            source,
            fetcher,
            cfg: app.source(source).clone(),
            user_agent: app.user_agent.clone(),
        }
    }

    pub fn source(&self) -> Source {
        self.source
    }

    async fn check_credential(&self) -> Result<(), CollectError> {
        let Some(probe) = sources::credential_probe(self.source, &self.cfg, &self.user_agent)
        else {
            return Ok(());
        };

        if self.cfg.cookie.as_deref().map_or(true, |c| c.trim().is_empty()) {
            return Err(CollectError::CredentialInvalid(
                "no cookie configured".into(),
            ));
        }

        match self.fetcher.fetch(&probe).await {
            Ok(page) if sources::is_login_wall(self.source, &page.body) => Err(
                CollectError::CredentialInvalid("probe landed on login page".into()),
            ),
            Ok(_) => Ok(()),
            Err(FetchError::Status { status, .. }) if status == 401 || status == 403 => Err(
                CollectError::CredentialInvalid(format!("probe answered HTTP {status}")),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Run the source once. Empty output with `Ok` means the page was fetched
    /// but nothing on it was recognizable.
    pub async fn try_collect(&self) -> Result<Vec<TopicRecord>, CollectError> {
        self.check_credential().await?;

        let req = sources::listing_request(self.source, &self.cfg, &self.user_agent);
        let page = self.fetcher.fetch(&req).await?;

        if sources::is_login_wall(self.source, &page.body) {
            return Err(CollectError::CredentialInvalid(
                "listing served login page".into(),
            ));
        }

        let records = extract::extract(sources::plan(self.source), &page);
        if records.is_empty() {
            tracing::info!(source = %self.source, url = %page.url, "page fetched but no topics recognized");
        }
        Ok(records)
    }

    /// Boundary form of [`Collector::try_collect`]: failures are logged,
    /// counted and turned into an empty list.
    pub async fn collect(&self) -> Vec<TopicRecord> {
        let res = self.try_collect().await;
        self.record_outcome(&res);
        res.unwrap_or_default()
    }

    /// Count extracted records, or count and log the failure.
    pub(crate) fn record_outcome(&self, res: &Result<Vec<TopicRecord>, CollectError>) {
        match res {
            Ok(records) => {
                counter!("collect_records_total", "source" => self.source.as_str())
                    .increment(records.len() as u64);
            }
            Err(e) => self.log_failure(e),
        }
    }

    fn log_failure(&self, e: &CollectError) {
        counter!(
            "collect_errors_total",
            "source" => self.source.as_str(),
            "kind" => e.kind()
        )
        .increment(1);
        match e {
            CollectError::CredentialInvalid(reason) => tracing::warn!(
                source = %self.source,
                reason = %reason,
                "credential expired or missing; update the cookie"
            ),
            CollectError::Fetch(err) => {
                tracing::warn!(source = %self.source, error = %err, "fetch failed")
            }
        }
    }
}
