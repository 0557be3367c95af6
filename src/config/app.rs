// src/config/app.rs
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::collect::types::Source;
use crate::store::ReplacePolicy;

/// Collection runs less often than this are refused at load time.
pub const MIN_CRAWL_INTERVAL_MINUTES: u64 = 30;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("CRAWL_INTERVAL_MINUTES={minutes} is below the minimum of {min} minutes")]
    IntervalTooShort { minutes: u64, min: u64 },
    #[error("invalid {key}='{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub url: String,
    pub cookie: Option<String>,
}

/// Everything the process needs, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub zhihu: SourceConfig,
    pub weibo: SourceConfig,
    pub user_agent: String,
    pub crawl_interval: Duration,
    pub request_timeout: Duration,
    pub replace_policy: ReplacePolicy,
}

impl AppConfig {
    /// Read the process environment. The binary loads `.env` before calling this.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from any key lookup; unset and blank values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_path = parse_database_url(
            &get("DATABASE_URL").unwrap_or_else(|| "hot_topics.db".to_string()),
        )?;

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8000".to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e: std::net::AddrParseError| invalid("BIND_ADDR", &bind_raw, e.to_string()))?;

        let zhihu = SourceConfig {
            url: parse_url(
                "ZHIHU_HOT_URL",
                get("ZHIHU_HOT_URL").unwrap_or_else(|| "https://www.zhihu.com/hot".into()),
            )?,
            cookie: get("ZHIHU_COOKIE"),
        };
        let weibo = SourceConfig {
            url: parse_url(
                "WEIBO_HOT_URL",
                get("WEIBO_HOT_URL").unwrap_or_else(|| "https://s.weibo.com/top/summary".into()),
            )?,
            cookie: get("WEIBO_COOKIE"),
        };

        let minutes = parse_u64("CRAWL_INTERVAL_MINUTES", get("CRAWL_INTERVAL_MINUTES"), 30)?;
        if minutes < MIN_CRAWL_INTERVAL_MINUTES {
            return Err(ConfigError::IntervalTooShort {
                minutes,
                min: MIN_CRAWL_INTERVAL_MINUTES,
            });
        }

        let timeout_secs = parse_u64("REQUEST_TIMEOUT_SECS", get("REQUEST_TIMEOUT_SECS"), 15)?;
        if timeout_secs == 0 {
            return Err(invalid("REQUEST_TIMEOUT_SECS", "0", "must be positive"));
        }

        let replace_policy = match get("REPLACE_POLICY") {
            None => ReplacePolicy::default(),
            Some(v) => v
                .parse::<ReplacePolicy>()
                .map_err(|e| invalid("REPLACE_POLICY", &v, e))?,
        };

        Ok(Self {
            database_path,
            bind_addr,
            zhihu,
            weibo,
            user_agent: get("USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            crawl_interval: Duration::from_secs(minutes * 60),
            request_timeout: Duration::from_secs(timeout_secs),
            replace_policy,
        })
    }

    pub fn source(&self, source: Source) -> &SourceConfig {
        match source {
            Source::Zhihu => &self.zhihu,
            Source::Weibo => &self.weibo,
        }
    }
}

fn parse_u64(key: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|e: std::num::ParseIntError| invalid(key, &v, e.to_string())),
    }
}

fn parse_url(key: &'static str, raw: String) -> Result<String, ConfigError> {
    match url::Url::parse(&raw) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(raw),
        Ok(u) => Err(invalid(key, &raw, format!("unsupported scheme {}", u.scheme()))),
        Err(e) => Err(invalid(key, &raw, e.to_string())),
    }
}

/// Accepts a bare path, `sqlite:path` or `sqlite://path`.
fn parse_database_url(raw: &str) -> Result<PathBuf, ConfigError> {
    let path = raw
        .strip_prefix("sqlite://")
        .or_else(|| raw.strip_prefix("sqlite:"))
        .unwrap_or(raw);
    if path.contains("://") {
        return Err(invalid("DATABASE_URL", raw, "only SQLite databases are supported"));
    }
    if path.is_empty() {
        return Err(invalid("DATABASE_URL", raw, "empty path"));
    }
    Ok(PathBuf::from(path))
}
