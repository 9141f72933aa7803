use std::collections::BTreeSet;

use percent_encoding::percent_decode_str;
use tracing::{info, warn};
use url::Url;

use crate::fetch::Fetcher;
use crate::render;

/// Deduplicated relevant links for one site. Iterates in lexical order.
pub type LinkSet = BTreeSet<String>;

pub const RELEVANT_KEYWORDS: &[&str] = &[
    "about", "company", "history", "mission", "values", "ethics", "sustainability",
    "corporate", "leadership", "executives", "our story", "who we are", "governance",
    "team", "culture", "foundation", "commitment", "social responsibility", "impact",
    "our vision", "principles", "philosophy", "brand story", "heritage", "our legacy",
    "purpose", "csr", "initiatives", "innovation", "environment", "diversity",
    "inclusion", "careers", "investors", "locations", "where we are", "suppliers",
    "partners", "contact", "media", "news", "awards", "recognition",
];

/// Case-insensitive substring match of the whole URL against the keyword list.
pub fn is_relevant(url: &str) -> bool {
    let lower = url.to_lowercase();
    RELEVANT_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Resolve hrefs against `base`, keep relevant http(s) targets, dedup without fragments.
///
/// Classification sees the decoded URL with its fragment, so `#about` and
/// `/our%20story` both count.
pub fn resolve_links<I, S>(base: &Url, hrefs: I) -> LinkSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    hrefs
        .into_iter()
        .filter_map(|href| base.join(href.as_ref()).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .filter(|u| is_relevant(&percent_decode_str(u.as_str()).decode_utf8_lossy()))
        .map(|mut u| {
            u.set_fragment(None);
            u.to_string()
        })
        .collect()
}

/// Fetch the homepage and return its relevant links. Any failure yields an empty set.
pub async fn discover(fetcher: &dyn Fetcher, site: &str) -> LinkSet {
    let base = match Url::parse(site) {
        Ok(u) => u,
        Err(e) => {
            warn!("Failed to fetch {}: invalid URL ({})", site, e);
            return LinkSet::new();
        }
    };

    let html = match fetcher.fetch(site).await {
        Ok(body) => body,
        Err(e) if e.is_forbidden() => {
            warn!("Failed to fetch {}: 403 Forbidden", site);
            return LinkSet::new();
        }
        Err(e) => {
            warn!("Failed to fetch {}: {}", site, e);
            return LinkSet::new();
        }
    };

    let hrefs = render::anchor_targets(&html);
    let links = resolve_links(&base, &hrefs);
    info!(
        "Found {} relevant links on {} ({} anchors)",
        links.len(),
        site,
        hrefs.len()
    );
    links
}
