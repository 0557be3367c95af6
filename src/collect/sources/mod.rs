// src/collect/sources/mod.rs
pub mod weibo;
pub mod zhihu;

use crate::collect::client::FetchRequest;
use crate::collect::extract::SelectorPlan;
use crate::collect::types::Source;
use crate::config::SourceConfig;

pub fn plan(source: Source) -> &'static SelectorPlan {
    match source {
        Source::Zhihu => &zhihu::PLAN,
        Source::Weibo => &weibo::PLAN,
    }
}

pub fn listing_request(source: Source, cfg: &SourceConfig, user_agent: &str) -> FetchRequest {
    match source {
        Source::Zhihu => zhihu::listing_request(cfg, user_agent),
        Source::Weibo => weibo::listing_request(cfg, user_agent),
    }
}

/// Sources behind a login return their credential probe; public ones `None`.
pub fn credential_probe(source: Source, cfg: &SourceConfig, user_agent: &str) -> Option<FetchRequest> {
    match source {
        Source::Zhihu => Some(zhihu::probe_request(cfg, user_agent)),
        Source::Weibo => None,
    }
}

pub fn is_login_wall(source: Source, body: &str) -> bool {
    match source {
        Source::Zhihu => zhihu::is_login_wall(body),
        Source::Weibo => false,
    }
}
