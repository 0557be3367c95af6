// src/collect/sources/weibo.rs
//! Weibo realtime hot search (`/top/summary`). Public, no credential.

use crate::collect::client::FetchRequest;
use crate::collect::extract::{LinkRule, SelectorPlan};
use crate::collect::types::Source;
use crate::config::SourceConfig;

pub const ORIGIN: &str = "https://s.weibo.com";

// Rows are `td.td-02` cells: the anchor carries the title, the sibling span
// the heat value. Promoted rows put the real link in `href_to`.
pub const PLAN: SelectorPlan = SelectorPlan {
    source: Source::Weibo,
    origin: ORIGIN,
    items: &["#pl_top_realtimehot td.td-02", ".td-02", ".list_a li"],
    title: &["a"],
    link: &[
        LinkRule::Attr {
            selector: "a[href_to]",
            attr: "href_to",
        },
        LinkRule::TitleHref,
    ],
    metric: &["span", ".td-03"],
    canonical: None,
};

pub fn listing_request(cfg: &SourceConfig, user_agent: &str) -> FetchRequest {
    FetchRequest::get(cfg.url.clone())
        .header("User-Agent", user_agent)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        )
        .header("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8")
        .header("Cookie", cfg.cookie.clone().unwrap_or_default())
}
