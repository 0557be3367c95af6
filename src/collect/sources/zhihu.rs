// src/collect/sources/zhihu.rs
//! Zhihu hot list (`/hot`). Requires a logged-in cookie; without one the
//! site serves a login wall instead of the list.

use url::Url;

use crate::collect::client::FetchRequest;
use crate::collect::extract::{CanonicalRewrite, LinkRule, SelectorPlan};
use crate::collect::types::Source;
use crate::config::SourceConfig;

pub const ORIGIN: &str = "https://www.zhihu.com";

/// Layout variants seen in the wild, newest first.
pub const PLAN: SelectorPlan = SelectorPlan {
    source: Source::Zhihu,
    origin: ORIGIN,
    items: &[".HotList-item", ".HotItem", "[data-zop-itemid]"],
    title: &[
        ".HotList-itemTitle",
        ".HotItem-title",
        ".HotItem-content",
        "a",
    ],
    link: &[
        LinkRule::TitleHref,
        LinkRule::TitleParentHref,
        LinkRule::Attr {
            selector: "a[href]",
            attr: "href",
        },
    ],
    metric: &[".HotList-itemMetrics", ".HotItem-metrics", ".HotItem-meta"],
    canonical: Some(CanonicalRewrite {
        pattern: r"/question/(\d+)",
        target: "https://www.zhihu.com/question/$1",
    }),
};

/// Both words appear together only on the logged-out landing page.
const LOGIN_WALL_MARKERS: [&str; 2] = ["登录", "注册"];

pub fn is_login_wall(body: &str) -> bool {
    LOGIN_WALL_MARKERS.iter().all(|m| body.contains(m))
}

fn with_headers(req: FetchRequest, cfg: &SourceConfig, user_agent: &str) -> FetchRequest {
    req.header("User-Agent", user_agent)
        .header(
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        )
        .header("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8")
        .header("Referer", format!("{ORIGIN}/"))
        .header("Cookie", cfg.cookie.clone().unwrap_or_default())
        .header("Sec-Fetch-Dest", "document")
        .header("Sec-Fetch-Mode", "navigate")
        .header("Sec-Fetch-Site", "same-origin")
        .header("Upgrade-Insecure-Requests", "1")
}

pub fn listing_request(cfg: &SourceConfig, user_agent: &str) -> FetchRequest {
    with_headers(FetchRequest::get(cfg.url.clone()), cfg, user_agent)
}

/// Cheap authenticated request against the site root of the configured
/// listing URL, used to tell an expired cookie apart from a layout change.
pub fn probe_request(cfg: &SourceConfig, user_agent: &str) -> FetchRequest {
    let root = Url::parse(&cfg.url)
        .and_then(|u| u.join("/"))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{ORIGIN}/"));
    with_headers(FetchRequest::get(root), cfg, user_agent)
}
