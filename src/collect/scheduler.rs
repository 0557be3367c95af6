// src/collect/scheduler.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::collect::types::{PageFetcher, Source, TopicRecord};
use crate::collect::{ensure_metrics_described, CollectError, Collector};
use crate::config::AppConfig;
use crate::store::{ReplaceSummary, SnapshotStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Collected(usize),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub zhihu: SourceOutcome,
    pub weibo: SourceOutcome,
    /// `None` when the store write failed.
    pub stored: Option<ReplaceSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    Ran(CycleReport),
    /// A cycle was already running; this firing was dropped.
    Skipped,
    /// The cycle task panicked. Nothing was written.
    Aborted,
}

/// Both collectors plus the store: one full collection cycle.
pub struct Pipeline {
    zhihu: Collector,
    weibo: Collector,
    store: SnapshotStore,
}

impl Pipeline {
    pub fn new(cfg: &AppConfig, fetcher: Arc<dyn PageFetcher>, store: SnapshotStore) -> Self {
        Self {
            zhihu: Collector::new(Source::Zhihu, fetcher.clone(), cfg),
            weibo: Collector::new(Source::Weibo, fetcher, cfg),
            store,
        }
    }

    fn settle(
        collector: &Collector,
        res: Result<Vec<TopicRecord>, CollectError>,
    ) -> (Vec<TopicRecord>, SourceOutcome) {
        collector.record_outcome(&res);
        match res {
            Ok(records) => {
                let n = records.len();
                (records, SourceOutcome::Collected(n))
            }
            Err(e) => (Vec::new(), SourceOutcome::Failed(e.to_string())),
        }
    }

    /// Collect both sources concurrently, then write the snapshot once.
    pub async fn run_cycle(&self) -> CycleReport {
        ensure_metrics_described();

        let (z, w) = tokio::join!(self.zhihu.try_collect(), self.weibo.try_collect());
        let (zhihu_records, zhihu) = Self::settle(&self.zhihu, z);
        let (weibo_records, weibo) = Self::settle(&self.weibo, w);

        let stored = match self.store.replace(zhihu_records, weibo_records).await {
            Ok(summary) => Some(summary),
            Err(e) => {
                counter!("store_errors_total").increment(1);
                tracing::error!(error = %e, "snapshot replacement failed; previous snapshot kept");
                None
            }
        };

        counter!("cycles_total").increment(1);
        gauge!("cycle_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

        tracing::info!(
            target: "collect",
            zhihu = ?zhihu,
            weibo = ?weibo,
            stored = ?stored,
            "collection cycle finished"
        );

        CycleReport {
            zhihu,
            weibo,
            stored,
        }
    }
}

/// Clears the running flag when the cycle ends, panics included.
struct RunGuard(Arc<AtomicBool>);

impl RunGuard {
    fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(flag.clone()))
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Fires the pipeline once at start and then every `interval`; at most one
/// cycle runs at a time.
pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    interval: Duration,
    running: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(pipeline: Pipeline, interval: Duration) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            interval,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one cycle unless one is already in flight.
    pub async fn fire(&self) -> FireOutcome {
        let Some(guard) = RunGuard::try_acquire(&self.running) else {
            counter!("cycles_skipped_total").increment(1);
            tracing::warn!(target: "collect", "previous cycle still running; firing dropped");
            return FireOutcome::Skipped;
        };

        // the guard lives in the cycle task, so a caller that stops waiting
        // does not free the slot while the cycle is still running
        let pipeline = self.pipeline.clone();
        let cycle = tokio::spawn(async move {
            let _guard = guard;
            pipeline.run_cycle().await
        });
        match cycle.await {
            Ok(report) => FireOutcome::Ran(report),
            Err(e) => {
                tracing::error!(target: "collect", error = %e, "collection cycle aborted");
                FireOutcome::Aborted
            }
        }
    }

    /// Start the timer loop. The first tick fires immediately.
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tracing::info!(
                target: "collect",
                interval_secs = self.interval.as_secs(),
                "scheduler started"
            );
            loop {
                ticker.tick().await;
                let this = self.clone();
                // each firing on its own task so the timer keeps ticking
                tokio::spawn(async move {
                    this.fire().await;
                });
            }
        })
    }
}
