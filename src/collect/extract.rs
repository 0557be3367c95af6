// src/collect/extract.rs
//! Selector-plan driven extraction.
//!
//! A [`SelectorPlan`] lists, per field, the selectors to try in order. The
//! first one that yields a non-empty value wins. Supporting a new layout
//! variant means appending to a list, not adding a branch.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::collect::normalize_text;
use crate::collect::types::{RawPage, Source, TopicRecord};

/// How to find an item's link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRule {
    /// `href` on the element that produced the title.
    TitleHref,
    /// `href` on the title element's parent (title nested inside the anchor).
    TitleParentHref,
    /// `attr` on the first descendant of the item matching `selector`.
    Attr {
        selector: &'static str,
        attr: &'static str,
    },
}

/// Rewrites links matching `pattern` to `target`, where `target` may refer
/// to capture groups (`$1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalRewrite {
    pub pattern: &'static str,
    pub target: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct SelectorPlan {
    pub source: Source,
    pub origin: &'static str,
    pub items: &'static [&'static str],
    pub title: &'static [&'static str],
    pub link: &'static [LinkRule],
    pub metric: &'static [&'static str],
    pub canonical: Option<CanonicalRewrite>,
}

/// Plan with its selectors parsed. Unparseable entries are dropped (and
/// logged) so one bad selector cannot take the whole chain down.
struct CompiledPlan {
    items: Vec<Selector>,
    title: Vec<Selector>,
    link: Vec<(LinkRule, Option<Selector>)>,
    metric: Vec<Selector>,
    origin: Option<Url>,
    canonical: Option<(Regex, &'static str)>,
}

fn compile_all(list: &[&'static str]) -> Vec<Selector> {
    list.iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(sel) => Some(sel),
            Err(e) => {
                tracing::warn!(selector = s, error = %e, "invalid selector skipped");
                None
            }
        })
        .collect()
}

impl CompiledPlan {
    fn new(plan: &SelectorPlan) -> Self {
        let link = plan
            .link
            .iter()
            .filter_map(|rule| match rule {
                LinkRule::Attr { selector, .. } => {
                    compile_all(&[*selector]).pop().map(|s| (*rule, Some(s)))
                }
                _ => Some((*rule, None)),
            })
            .collect();

        let canonical = plan.canonical.and_then(|c| match Regex::new(c.pattern) {
            Ok(re) => Some((re, c.target)),
            Err(e) => {
                tracing::warn!(pattern = c.pattern, error = %e, "invalid canonical pattern");
                None
            }
        });

        Self {
            items: compile_all(plan.items),
            title: compile_all(plan.title),
            link,
            metric: compile_all(plan.metric),
            origin: Url::parse(plan.origin).ok(),
            canonical,
        }
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    normalize_text(&el.text().collect::<String>())
}

fn usable_href(v: &str) -> Option<String> {
    let v = v.trim();
    if v.is_empty() || v.starts_with("javascript:") || v == "#" {
        None
    } else {
        Some(v.to_string())
    }
}

/// First title selector that gives non-empty text, with the element it came from.
fn pick_title<'a>(item: ElementRef<'a>, plan: &CompiledPlan) -> Option<(ElementRef<'a>, String)> {
    plan.title.iter().find_map(|sel| {
        item.select(sel)
            .next()
            .map(|el| (el, element_text(el)))
            .filter(|(_, t)| !t.is_empty())
    })
}

fn pick_link(item: ElementRef<'_>, title_el: ElementRef<'_>, plan: &CompiledPlan) -> String {
    plan.link
        .iter()
        .find_map(|(rule, sel)| match (rule, sel) {
            (LinkRule::TitleHref, _) => title_el.value().attr("href").and_then(usable_href),
            (LinkRule::TitleParentHref, _) => title_el
                .parent()
                .and_then(ElementRef::wrap)
                .and_then(|p| p.value().attr("href"))
                .and_then(usable_href),
            (LinkRule::Attr { attr, .. }, Some(sel)) => item
                .select(sel)
                .find_map(|el| el.value().attr(attr).and_then(usable_href)),
            (LinkRule::Attr { .. }, None) => None,
        })
        .unwrap_or_default()
}

fn pick_metric(item: ElementRef<'_>, plan: &CompiledPlan) -> Option<String> {
    plan.metric.iter().find_map(|sel| {
        item.select(sel)
            .next()
            .map(element_text)
            .filter(|t| !t.is_empty())
    })
}

fn resolve_link(href: String, plan: &CompiledPlan) -> String {
    // anything that is not already an absolute URL is resolved against the origin
    let absolute = match (&plan.origin, Url::parse(&href)) {
        (_, Ok(_)) => href,
        (Some(origin), Err(_)) => origin
            .join(&href)
            .map(|u| u.to_string())
            .unwrap_or(href),
        (None, Err(_)) => href,
    };

    if let Some((re, target)) = &plan.canonical {
        if let Some(caps) = re.captures(&absolute) {
            let mut out = String::new();
            caps.expand(target, &mut out);
            return out;
        }
    }
    absolute
}

/// Parse `page` with `plan`. Never fails: a page that matches none of the
/// item selectors gives an empty list.
pub fn extract(plan: &SelectorPlan, page: &RawPage) -> Vec<TopicRecord> {
    let compiled = CompiledPlan::new(plan);
    let document = Html::parse_document(&page.body);

    let items: Vec<ElementRef<'_>> = compiled
        .items
        .iter()
        .map(|sel| document.select(sel).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default();

    if items.is_empty() {
        tracing::debug!(
            source = %plan.source,
            url = %page.url,
            "no item selector matched; page layout not recognized"
        );
        return Vec::new();
    }

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let Some((title_el, title)) = pick_title(item, &compiled) else {
            tracing::trace!(source = %plan.source, "item without title dropped");
            continue;
        };
        let url = resolve_link(pick_link(item, title_el, &compiled), &compiled);
        let hot_value = pick_metric(item, &compiled);
        let rank = out.len() as u32 + 1;

        out.push(TopicRecord {
            title,
            url,
            source: plan.source,
            rank,
            hot_value,
        });
    }

    tracing::debug!(source = %plan.source, count = out.len(), "extracted topics");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: SelectorPlan = SelectorPlan {
        source: Source::Zhihu,
        origin: "https://example.com",
        items: &[".missing", "li.entry"],
        title: &[".headline", "a"],
        link: &[LinkRule::TitleHref, LinkRule::TitleParentHref],
        metric: &[".score"],
        canonical: Some(CanonicalRewrite {
            pattern: r"/post/(\d+)",
            target: "https://example.com/post/$1",
        }),
    };

    fn page(body: &str) -> RawPage {
        RawPage::new("https://example.com/list", body)
    }

    #[test]
    fn falls_back_to_second_item_selector() {
        let html = r#"<ul><li class="entry"><a href="/a">First</a></li>
            <li class="entry"><a href="/b">Second</a></li></ul>"#;
        let out = extract(&PLAN, &page(html));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].url, "https://example.com/a");
        assert_eq!(out[1].rank, 2);
    }

    #[test]
    fn title_from_nested_element_uses_parent_href() {
        let html = r#"<li class="entry"><a href="/post/42?utm=x"><h2 class="headline"> Nested
            title </h2></a><span class="score">9k</span></li>"#;
        let out = extract(&PLAN, &page(html));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Nested title");
        assert_eq!(out[0].url, "https://example.com/post/42");
        assert_eq!(out[0].hot_value.as_deref(), Some("9k"));
    }

    #[test]
    fn untitled_items_are_dropped_and_ranks_stay_contiguous() {
        let html = r#"<li class="entry"><a href="/1">One</a></li>
            <li class="entry"><a href="/2">   </a></li>
            <li class="entry"><a href="/3">Three</a></li>"#;
        let out = extract(&PLAN, &page(html));
        let ranks: Vec<u32> = out.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
        assert_eq!(out[1].title, "Three");
    }

    #[test]
    fn unknown_layout_gives_empty() {
        let out = extract(&PLAN, &page("<html><body><p>maintenance</p></body></html>"));
        assert!(out.is_empty());
    }

    #[test]
    fn path_relative_and_scheme_relative_links_become_absolute() {
        let html = r#"<li class="entry"><a href="weibo?q=%23topic%23">Bare</a></li>
            <li class="entry"><a href="//cdn.example.com/x">Proto</a></li>
            <li class="entry"><a href="https://other.org/y">Abs</a></li>"#;
        let out = extract(&PLAN, &page(html));
        assert_eq!(out[0].url, "https://example.com/weibo?q=%23topic%23");
        assert_eq!(out[1].url, "https://cdn.example.com/x");
        assert_eq!(out[2].url, "https://other.org/y");
    }

    #[test]
    fn javascript_links_are_ignored() {
        let html = r#"<li class="entry"><a href="javascript:void(0);">Ad</a></li>"#;
        let out = extract(&PLAN, &page(html));
        assert_eq!(out[0].url, "");
    }
}
