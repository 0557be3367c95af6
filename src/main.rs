//! Hot topics service: binary entrypoint.
//! Loads configuration, starts the collection scheduler and serves the read API.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hot_topics::api::{self, AppState};
use hot_topics::collect::client::HttpFetcher;
use hot_topics::collect::types::PageFetcher;
use hot_topics::metrics::Metrics;
use hot_topics::{AppConfig, Pipeline, Scheduler, SnapshotStore};

/// `RUST_LOG` controls verbosity; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hot_topics=info,collect=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .ok()
        .is_some_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler failed");
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env().context("loading configuration")?;
    if cfg.zhihu.cookie.is_none() {
        tracing::warn!("ZHIHU_COOKIE not set; zhihu will be skipped until it is configured");
    }

    let store = SnapshotStore::open(&cfg.database_path, cfg.replace_policy)
        .with_context(|| format!("opening database {}", cfg.database_path.display()))?;

    let fetcher: Arc<dyn PageFetcher> =
        Arc::new(HttpFetcher::new(cfg.request_timeout).context("building http client")?);
    let scheduler = Arc::new(Scheduler::new(
        Pipeline::new(&cfg, fetcher, store.clone()),
        cfg.crawl_interval,
    ));
    // recorder before the first cycle fires
    let metrics = Metrics::init()?;
    let collector_task = scheduler.spawn();

    let app = api::router(AppState::new(store)).merge(metrics.router());

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    collector_task.abort();
    Ok(())
}
