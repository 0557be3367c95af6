// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod collect;
pub mod config;
pub mod metrics;
pub mod store;

pub use crate::api::router;
pub use crate::collect::scheduler::{FireOutcome, Pipeline, Scheduler};
pub use crate::collect::types::{Source, TopicRecord};
pub use crate::config::AppConfig;
pub use crate::store::{ReplacePolicy, SnapshotStore};
