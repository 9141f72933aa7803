use tracing::{debug, info, warn};

use crate::fetch::Fetcher;
use crate::links::LinkSet;
use crate::render;

/// Concatenated page text for one site, with counts for reporting.
#[derive(Debug, Default)]
pub struct AggregatedText {
    pub text: String,
    pub pages_ok: usize,
    pub pages_failed: usize,
}

impl AggregatedText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Provenance line that precedes each page's text.
pub fn provenance_marker(url: &str) -> String {
    format!("--- Content from {} ---", url)
}

/// Fetch and render every link. A failed page is logged and contributes nothing;
/// a fetched page always gets its marker, even with no visible text.
pub async fn aggregate(fetcher: &dyn Fetcher, links: &LinkSet) -> AggregatedText {
    let mut out = AggregatedText::default();

    for url in links {
        let html = match fetcher.fetch(url).await {
            Ok(body) => body,
            Err(e) if e.is_forbidden() => {
                warn!("Skipping {} (403 Forbidden)", url);
                out.pages_failed += 1;
                continue;
            }
            Err(e) => {
                warn!("Skipping {} due to {} error: {}", url, e.kind(), e);
                out.pages_failed += 1;
                continue;
            }
        };

        let page_text = render::html_to_text(&html);
        if page_text.is_empty() {
            debug!("No visible text on {}", url);
        }

        out.text.push('\n');
        out.text.push_str(&provenance_marker(url));
        out.text.push('\n');
        out.text.push_str(&page_text);
        out.pages_ok += 1;
    }

    info!(
        "Aggregated {} chars from {} pages ({} failed)",
        out.text.len(),
        out.pages_ok,
        out.pages_failed
    );
    out
}
