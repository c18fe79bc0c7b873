//! Text cleanup for names scraped from HTML.

use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Strip tags, decode entities and collapse whitespace (nbsp included).
pub fn decode_html_text(fragment: &str) -> String {
    let stripped = TAG.replace_all(fragment, " ");
    let decoded = Html::parse_fragment(&stripped)
        .root_element()
        .text()
        .collect::<String>();
    decoded
        .split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
