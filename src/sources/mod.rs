//! Per-site image source adapters.
//!
//! Each site implements [`ImageSource`]: how to build a search URL for a
//! keyword, which pagination policy reveals more results, and how to pull
//! image URLs out of the rendered page. The crawler selects adapters by
//! [`SourceId`] instead of branching on site names.

pub mod bing;
pub mod duckduckgo;
pub mod freeimages;

use regex::Regex;
use url::Url;

use crate::models::SourceId;

/// The per-site method used to reveal additional result elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationPolicy {
    /// Scroll to the bottom of the page; results lazy-load.
    ScrollToBottom,
    /// Click a "more results" control with the given selector.
    ClickMore { selector: &'static str },
    /// Read the href of the given anchor and navigate to it.
    FollowNextLink { selector: &'static str },
}

/// A crawlable image site: query construction, pagination, extraction.
pub trait ImageSource: Send + Sync {
    fn id(&self) -> SourceId;

    fn name(&self) -> &'static str {
        self.id().name()
    }

    /// Search-results URL for a keyword (percent-encoded as needed).
    fn search_url(&self, keyword: &str) -> String;

    /// Selector that proves the result listing rendered.
    fn result_selector(&self) -> &'static str;

    fn pagination(&self) -> PaginationPolicy;

    /// Image URLs from the rendered page HTML, absolute where the page
    /// provides them, page-relative otherwise (the crawler resolves them).
    fn extract_image_urls(&self, html: &str) -> Vec<String>;

    /// Search-box locators for query submission through the engine's own
    /// form, where the site has one.
    fn search_box(&self) -> Option<SearchBox> {
        None
    }
}

/// Locators for driving a site's search form directly.
#[derive(Debug, Clone)]
pub struct SearchBox {
    /// Page that hosts the form.
    pub home_url: &'static str,
    pub input_selector: &'static str,
    pub submit_selector: &'static str,
}

pub fn all_sources() -> Vec<Box<dyn ImageSource>> {
    vec![
        Box::new(bing::BingImages),
        Box::new(duckduckgo::DuckDuckGoImages),
        Box::new(freeimages::FreeImages),
    ]
}

pub fn source_by_id(id: SourceId) -> Box<dyn ImageSource> {
    match id {
        SourceId::Bing => Box::new(bing::BingImages),
        SourceId::DuckDuckGo => Box::new(duckduckgo::DuckDuckGoImages),
        SourceId::FreeImages => Box::new(freeimages::FreeImages),
    }
}

/// True for URLs that are page chrome rather than search results.
pub(crate) fn is_noise_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    lower.starts_with("data:")
        || lower.contains("logo")
        || lower.contains("icon")
        || lower.contains("avatar")
        || lower.contains("sprite")
        || lower.contains("badge")
        || lower.contains("1x1")
        || lower.contains("pixel")
        || lower.len() < 10
}

/// Last-resort sweep: direct image URLs anywhere in the HTML.
pub(crate) fn regex_image_urls(html: &str) -> Vec<String> {
    let re = Regex::new(r#"https?://[^"'\s<>\\]+\.(?:jpg|jpeg|png|gif|webp)"#).unwrap();
    let mut seen = std::collections::HashSet::new();
    let mut urls = Vec::new();
    for m in re.find_iter(html) {
        let url = m.as_str().to_string();
        if is_noise_url(&url) {
            continue;
        }
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }
    urls
}

/// Resolves candidate URLs against the page URL, dropping what cannot be
/// resolved, preserving order, removing repeats.
pub fn resolve_urls(page_url: &str, candidates: Vec<String>) -> Vec<String> {
    let base = Url::parse(page_url).ok();
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for candidate in candidates {
        let absolute = match Url::parse(&candidate) {
            Ok(u) => Some(u.to_string()),
            Err(_) => base
                .as_ref()
                .and_then(|b| b.join(&candidate).ok())
                .map(|u| u.to_string()),
        };
        if let Some(url) = absolute {
            if seen.insert(url.clone()) {
                out.push(url);
            }
        }
    }
    out
}
