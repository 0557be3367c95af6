// tests/common/mod.rs
// Shared helpers: a fixture-backed fetcher and config/store builders.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hot_topics::collect::client::{FetchError, FetchRequest};
use hot_topics::collect::types::{PageFetcher, RawPage, Source, TopicRecord};
use hot_topics::{AppConfig, ReplacePolicy, SnapshotStore};

pub const ZHIHU_HOT: &str = include_str!("../fixtures/zhihu_hot.html");
pub const ZHIHU_HOT_LEGACY: &str = include_str!("../fixtures/zhihu_hot_legacy.html");
pub const ZHIHU_LOGIN: &str = include_str!("../fixtures/zhihu_login.html");
pub const WEIBO_SUMMARY: &str = include_str!("../fixtures/weibo_summary.html");

pub const ZHIHU_URL: &str = "https://www.zhihu.com/hot";
pub const ZHIHU_ROOT: &str = "https://www.zhihu.com/";
pub const WEIBO_URL: &str = "https://s.weibo.com/top/summary";

#[derive(Clone)]
enum Reply {
    Page(String),
    Status(u16),
}

/// Answers requests from a URL → reply table. Unknown URLs get a transport error.
#[derive(Default)]
pub struct StubFetcher {
    routes: HashMap<String, Reply>,
    delay: Option<Duration>,
    pub seen: Mutex<Vec<FetchRequest>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.routes.insert(url.to_string(), Reply::Page(body.to_string()));
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(url.to_string(), Reply::Status(status));
        self
    }

    pub fn delayed(mut self, d: Duration) -> Self {
        self.delay = Some(d);
        self
    }

    pub fn urls_seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|r| r.url.clone()).collect()
    }
}

#[async_trait::async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<RawPage, FetchError> {
        self.seen.lock().unwrap().push(req.clone());
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        match self.routes.get(&req.url) {
            Some(Reply::Page(body)) => Ok(RawPage::new(req.url.clone(), body.clone())),
            Some(Reply::Status(status)) => Err(FetchError::Status {
                url: req.url.clone(),
                status: *status,
            }),
            None => Err(FetchError::Transport {
                url: req.url.clone(),
                reason: "connection refused".into(),
            }),
        }
    }
}

/// Config with defaults plus the given overrides.
pub fn config(pairs: &[(&str, &str)]) -> AppConfig {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    AppConfig::from_lookup(|k| map.get(k).cloned()).expect("test config")
}

pub fn config_with_cookie() -> AppConfig {
    config(&[("ZHIHU_COOKIE", "z_c0=test-token")])
}

pub fn temp_store(policy: ReplacePolicy) -> (tempfile::TempDir, SnapshotStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SnapshotStore::open(dir.path().join("hot_topics.db"), policy).expect("open store");
    (dir, store)
}

pub fn record(source: Source, rank: u32, title: &str) -> TopicRecord {
    TopicRecord {
        title: title.to_string(),
        url: format!("https://example.com/{}/{rank}", source.as_str()),
        source,
        rank,
        hot_value: Some(format!("{} 热度", 100 - rank)),
    }
}

pub fn records(source: Source, n: u32, prefix: &str) -> Vec<TopicRecord> {
    (1..=n).map(|r| record(source, r, &format!("{prefix}{r}"))).collect()
}

pub fn arc(f: StubFetcher) -> Arc<dyn PageFetcher> {
    Arc::new(f)
}
