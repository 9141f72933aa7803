use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static ANCHOR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];

/// Visible text of an HTML document: text nodes joined by single spaces.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut pieces: Vec<String> = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| SKIPPED_TAGS.contains(&el.value().name()));
        if hidden {
            continue;
        }
        let collapsed = WHITESPACE_RE.replace_all(text.trim(), " ");
        if !collapsed.is_empty() {
            pieces.push(collapsed.into_owned());
        }
    }

    pieces.join(" ")
}

/// Raw `href` values of every anchor, in document order.
pub fn anchor_targets(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR_SEL)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}
