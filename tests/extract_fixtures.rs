// tests/extract_fixtures.rs
mod common;

use common::{WEIBO_SUMMARY, ZHIHU_HOT, ZHIHU_HOT_LEGACY, ZHIHU_LOGIN};
use hot_topics::collect::extract::extract;
use hot_topics::collect::sources::{weibo, zhihu};
use hot_topics::collect::types::{RawPage, Source, TopicRecord};

fn zhihu(body: &str) -> Vec<TopicRecord> {
    extract(&zhihu::PLAN, &RawPage::new("https://www.zhihu.com/hot", body))
}

fn weibo(body: &str) -> Vec<TopicRecord> {
    extract(&weibo::PLAN, &RawPage::new("https://s.weibo.com/top/summary", body))
}

fn assert_well_formed(out: &[TopicRecord]) {
    let ranks: Vec<u32> = out.iter().map(|r| r.rank).collect();
    let expected: Vec<u32> = (1..=out.len() as u32).collect();
    assert_eq!(ranks, expected, "ranks must be contiguous from 1");
    assert!(
        out.iter().all(|r| !r.title.trim().is_empty()),
        "no record may have an empty title"
    );
}

#[test]
fn every_fixture_variant_yields_contiguous_ranks_and_titles() {
    for (name, out) in [
        ("zhihu", zhihu(ZHIHU_HOT)),
        ("zhihu legacy", zhihu(ZHIHU_HOT_LEGACY)),
        ("weibo", weibo(WEIBO_SUMMARY)),
    ] {
        assert!(!out.is_empty(), "{name}: expected records");
        assert_well_formed(&out);
    }
}

#[test]
fn zhihu_current_layout() {
    let out = zhihu(ZHIHU_HOT);
    assert_eq!(out.len(), 3);
    assert!(out.iter().all(|r| r.source == Source::Zhihu));

    assert_eq!(out[0].title, "如何看待今年的高温天气？");
    // tracking query dropped, canonical question link kept
    assert_eq!(out[0].url, "https://www.zhihu.com/question/601234567");
    assert_eq!(out[0].hot_value.as_deref(), Some("1234 万热度"));

    // relative link made absolute
    assert_eq!(out[1].url, "https://www.zhihu.com/question/602345678");

    // non-question links are left alone; multi-line title collapsed
    assert_eq!(out[2].url, "https://zhuanlan.zhihu.com/p/12345");
    assert_eq!(out[2].title, "程序员的 第一份工作");
    assert_eq!(out[2].hot_value, None);
}

#[test]
fn zhihu_legacy_layout_drops_untitled_item() {
    let out = zhihu(ZHIHU_HOT_LEGACY);
    let titles: Vec<&str> = out.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["旧版标题一", "旧版标题三"]);
    assert_eq!(out[0].url, "https://www.zhihu.com/question/111111");
    assert_eq!(out[0].hot_value.as_deref(), Some("300 万热度"));
    assert_eq!(out[1].rank, 2);
    assert_eq!(out[1].url, "https://www.zhihu.com/question/333333");
    assert_eq!(out[1].hot_value.as_deref(), Some("120 万热度"));
}

#[test]
fn weibo_summary_table() {
    let out = weibo(WEIBO_SUMMARY);
    let titles: Vec<&str> = out.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["置顶话题", "热搜一", "推广话题", "热搜三"]);
    assert!(out.iter().all(|r| r.source == Source::Weibo));

    assert_eq!(
        out[0].url,
        "https://s.weibo.com/weibo?q=%23%E7%BD%AE%E9%A1%B6%23&t=31"
    );
    assert_eq!(out[0].hot_value, None);
    assert_eq!(out[1].hot_value.as_deref(), Some("2345678"));

    // promoted row: real target lives in href_to
    assert_eq!(out[2].url, "https://s.weibo.com/weibo?q=%23%E6%8E%A8%E5%B9%BF%23");
    assert_eq!(out[2].hot_value.as_deref(), Some("剧集 123456"));
}

#[test]
fn unrecognized_pages_give_empty_results() {
    assert!(zhihu(ZHIHU_LOGIN).is_empty());
    assert!(weibo("<html><body><div class=\"card\">升级中</div></body></html>").is_empty());
    assert!(weibo("").is_empty());
}
