use serde::{Deserialize, Serialize};

/// Identifier for a crawlable image source.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Bing = 1,
    DuckDuckGo = 2,
    FreeImages = 3,
}

impl SourceId {
    pub fn name(&self) -> &'static str {
        match self {
            SourceId::Bing => "bing",
            SourceId::DuckDuckGo => "duckduckgo",
            SourceId::FreeImages => "freeimages",
        }
    }

    pub fn parse(s: &str) -> Option<SourceId> {
        match s.to_lowercase().as_str() {
            "bing" | "bing_img" => Some(SourceId::Bing),
            "duckduckgo" | "ddg" | "duckduckgo_img" => Some(SourceId::DuckDuckGo),
            "freeimages" | "free-images" => Some(SourceId::FreeImages),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One (site, keyword) pair driving one search-and-download pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub source: SourceId,
    pub keyword: String,
}

impl CrawlTarget {
    pub fn new(source: SourceId, keyword: impl Into<String>) -> Self {
        Self {
            source,
            keyword: keyword.into(),
        }
    }
}

/// A single image written to disk.
#[derive(Debug, Serialize, Clone)]
pub struct DownloadedImage {
    pub url: String,
    pub path: String,
    pub bytes: u64,
    pub content_hash: String,
}

/// Per-source progress within a crawl run.
#[derive(Debug, Default, Serialize, Clone)]
pub struct SourceProgress {
    pub name: String,
    pub keywords_done: usize,
    pub images_found: usize,
    pub images_downloaded: usize,
    pub duplicates_skipped: usize,
    pub failures: usize,
}

/// Overall crawl progress, cloned out for reporting.
#[derive(Debug, Default, Serialize, Clone)]
pub struct CrawlProgress {
    pub in_progress: bool,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
    pub current_target: Option<String>,
    pub sources: Vec<SourceProgress>,
    pub error: Option<String>,
}
