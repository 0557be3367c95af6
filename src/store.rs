//! Latest trending snapshot in SQLite.
//!
//! Every write goes through [`SnapshotStore::replace`], which runs as one
//! transaction. The database is opened in WAL mode and each operation uses
//! its own connection, so API reads see the last committed snapshot while a
//! replacement is in flight.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};
use serde::Serialize;

use crate::collect::types::{Source, TopicRecord};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS hot_topics (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT    NOT NULL,
    url         TEXT    NOT NULL,
    source      TEXT    NOT NULL CHECK (source IN ('zhihu', 'weibo')),
    rank        INTEGER NOT NULL CHECK (rank >= 1),
    hot_value   TEXT,
    created_at  TEXT    NOT NULL,
    updated_at  TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_hot_topics_source_rank ON hot_topics (source, rank);
";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store task failed: {0}")]
    Task(String),
}

/// How a cycle's results are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplacePolicy {
    /// Sources that produced nothing keep their previous rows.
    #[default]
    PerSource,
    /// Drop everything and insert whatever the cycle produced.
    WholeSnapshot,
}

impl FromStr for ReplacePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "per-source" => Ok(ReplacePolicy::PerSource),
            "whole-snapshot" | "whole" => Ok(ReplacePolicy::WholeSnapshot),
            other => Err(format!("expected per-source or whole-snapshot, got {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionChange {
    Replaced(usize),
    Kept,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceSummary {
    pub zhihu: PartitionChange,
    pub weibo: PartitionChange,
}

/// A persisted record as served by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredTopic {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub source: Source,
    pub rank: u32,
    pub hot_value: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    policy: ReplacePolicy,
}

impl SnapshotStore {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: impl AsRef<Path>, policy: ReplacePolicy) -> Result<Self, StoreError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            policy,
        };
        let conn = store.connect()?;
        conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
        conn.execute_batch(SCHEMA)?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    /// Write one cycle's results atomically. On error nothing changes.
    pub fn replace_blocking(
        &self,
        zhihu: &[TopicRecord],
        weibo: &[TopicRecord],
    ) -> Result<ReplaceSummary, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let now = Utc::now();

        let summary = match self.policy {
            ReplacePolicy::WholeSnapshot => {
                tx.execute("DELETE FROM hot_topics", [])?;
                insert_all(&tx, Source::Zhihu, zhihu, now)?;
                insert_all(&tx, Source::Weibo, weibo, now)?;
                ReplaceSummary {
                    zhihu: PartitionChange::Replaced(zhihu.len()),
                    weibo: PartitionChange::Replaced(weibo.len()),
                }
            }
            ReplacePolicy::PerSource => ReplaceSummary {
                zhihu: replace_partition(&tx, Source::Zhihu, zhihu, now)?,
                weibo: replace_partition(&tx, Source::Weibo, weibo, now)?,
            },
        };

        tx.commit()?;
        Ok(summary)
    }

    pub async fn replace(
        &self,
        zhihu: Vec<TopicRecord>,
        weibo: Vec<TopicRecord>,
    ) -> Result<ReplaceSummary, StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.replace_blocking(&zhihu, &weibo))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }

    /// Records ordered by ascending rank, optionally for one source only.
    pub fn list_blocking(
        &self,
        source: Option<Source>,
        limit: u32,
    ) -> Result<Vec<StoredTopic>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, url, source, rank, hot_value, created_at, updated_at
             FROM hot_topics
             WHERE (?1 IS NULL OR source = ?1)
             ORDER BY rank ASC, source ASC, id ASC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![source, limit], |row| {
            Ok(StoredTopic {
                id: row.get(0)?,
                title: row.get(1)?,
                url: row.get(2)?,
                source: row.get(3)?,
                rank: row.get(4)?,
                hot_value: row.get(5)?,
                created_at: row.get(6)?,
                updated_at: row.get(7)?,
            })
        })?;
        let out = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(out)
    }

    pub async fn list(
        &self,
        source: Option<Source>,
        limit: u32,
    ) -> Result<Vec<StoredTopic>, StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.list_blocking(source, limit))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn replace_partition(
    tx: &Transaction<'_>,
    source: Source,
    records: &[TopicRecord],
    now: DateTime<Utc>,
) -> Result<PartitionChange, StoreError> {
    if records.is_empty() {
        return Ok(PartitionChange::Kept);
    }
    tx.execute("DELETE FROM hot_topics WHERE source = ?1", params![source])?;
    insert_all(tx, source, records, now)?;
    Ok(PartitionChange::Replaced(records.len()))
}

fn insert_all(
    tx: &Transaction<'_>,
    source: Source,
    records: &[TopicRecord],
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let mut stmt = tx.prepare_cached(
        "INSERT INTO hot_topics (title, url, source, rank, hot_value, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    )?;
    for r in records {
        // the partition key wins over whatever the record claims
        stmt.execute(params![r.title, r.url, source, r.rank, r.hot_value, now])?;
    }
    Ok(())
}
