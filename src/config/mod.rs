// src/config/mod.rs
pub mod app;

pub use app::{AppConfig, ConfigError, SourceConfig, MIN_CRAWL_INTERVAL_MINUTES};
