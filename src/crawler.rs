use chrono::Utc;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use url::Url;

use crate::browser::{BrowserConfig, BrowserError, BrowserManager, BrowserPage};
use crate::config::Config;
use crate::download::{self, ImageStore};
use crate::http_client::DownloadClient;
use crate::keywords;
use crate::metrics::MetricsTracker;
use crate::models::{CrawlProgress, CrawlTarget, SourceProgress};
use crate::sources::{self, ImageSource, PaginationPolicy};

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keyword list error: {0}")]
    Keywords(#[from] csv::Error),
}

/// Drives one browser through every enabled source for every keyword,
/// downloading what the sources yield.
pub struct ImageCrawl {
    config: Config,
    manager: BrowserManager,
    client: DownloadClient,
    metrics: MetricsTracker,
    progress: Arc<Mutex<CrawlProgress>>,
}

impl ImageCrawl {
    pub fn new(config: Config) -> Result<Self, CrawlError> {
        let browser_config = BrowserConfig::from_settings(&config.browser);

        // Downloads exit through the same proxy as page traffic
        let proxy = match browser_config.proxy.as_ref() {
            Some(p) => Some(p.to_reqwest_proxy()?),
            None => None,
        };
        let client = DownloadClient::with_settings_and_proxy(config.http.clone(), proxy)?;

        let manager = BrowserManager::new(browser_config)?;

        Ok(Self {
            config,
            manager,
            client,
            metrics: MetricsTracker::new(),
            progress: Arc::new(Mutex::new(CrawlProgress::default())),
        })
    }

    pub fn metrics(&self) -> &MetricsTracker {
        &self.metrics
    }

    pub fn progress(&self) -> CrawlProgress {
        self.progress
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    fn page(&self) -> Result<BrowserPage, BrowserError> {
        let tab = self.manager.new_tab()?;
        Ok(BrowserPage::with_timings(
            tab,
            self.manager.config().timeout(),
            self.manager.config().settle_delay(),
        ))
    }

    /// Query-submission pass: drive each engine's own search form for one
    /// keyword and leave the results page loaded. Engines without a form are
    /// skipped; a failing engine does not stop the rest.
    pub fn submit_queries(&self, keyword: &str) {
        for source in sources::all_sources() {
            let locators = match source.search_box() {
                Some(locators) => locators,
                None => continue,
            };
            info!("Submitting '{}' through {}", keyword, source.name());
            if let Err(e) = self.submit_query(&locators, keyword) {
                error!("{} query submission failed: {}", source.name(), e);
            }
        }
    }

    fn submit_query(
        &self,
        locators: &sources::SearchBox,
        keyword: &str,
    ) -> Result<(), CrawlError> {
        let page = self.page()?;
        page.load(locators.home_url)?;
        page.wait_for_selector(locators.input_selector)?;
        if !page.fill(locators.input_selector, keyword) {
            return Err(BrowserError::ElementNotFound(locators.input_selector.to_string()).into());
        }
        page.click_and_wait(locators.submit_selector)?;
        info!("Results page: {}", page.current_url());
        let _ = page.tab().close(true);
        Ok(())
    }

    /// Full crawl: every enabled source x every keyword.
    pub async fn run(&self, keyword_list: &[String]) -> Result<CrawlProgress, CrawlError> {
        {
            let mut p = self.progress.lock().unwrap();
            *p = CrawlProgress {
                in_progress: true,
                started_at: Some(Utc::now().timestamp()),
                ..CrawlProgress::default()
            };
        }

        for id in self.config.enabled_sources() {
            let source = sources::source_by_id(id);
            let mut source_progress = SourceProgress {
                name: source.name().to_string(),
                ..SourceProgress::default()
            };

            for keyword in keyword_list {
                let target = CrawlTarget::new(id, keyword.clone());
                {
                    let mut p = self.progress.lock().unwrap();
                    p.current_target = Some(format!("{}/{}", target.source, target.keyword));
                }

                match self.crawl_target(source.as_ref(), keyword).await {
                    Ok(stats) => {
                        source_progress.keywords_done += 1;
                        source_progress.images_found += stats.images_found;
                        source_progress.images_downloaded += stats.images_downloaded;
                        source_progress.duplicates_skipped += stats.duplicates_skipped;
                        source_progress.failures += stats.failures;
                    }
                    Err(e) => {
                        // One bad target never stops the crawl
                        error!("{} '{}' failed: {}", source.name(), keyword, e);
                        source_progress.failures += 1;
                        self.metrics
                            .with_source(source.name(), |m| m.record_failure(e.to_string()));
                    }
                }
            }

            info!(
                "{} finished: {} downloaded, {} duplicates, {} failures",
                source.name(),
                source_progress.images_downloaded,
                source_progress.duplicates_skipped,
                source_progress.failures
            );
            let mut p = self.progress.lock().unwrap();
            p.sources.push(source_progress);
        }

        self.metrics.log_summary();

        let mut p = self.progress.lock().unwrap();
        p.in_progress = false;
        p.finished_at = Some(Utc::now().timestamp());
        p.current_target = None;
        Ok(p.clone())
    }

    /// One search-and-download pass for a (site, keyword) pair.
    async fn crawl_target(
        &self,
        source: &dyn ImageSource,
        keyword: &str,
    ) -> Result<SourceProgress, CrawlError> {
        let mut stats = SourceProgress {
            name: source.name().to_string(),
            ..SourceProgress::default()
        };

        let page = self.page()?;
        let search_url = source.search_url(keyword);
        info!("{} <- '{}' ({})", source.name(), keyword, search_url);
        page.load(&search_url)?;
        self.metrics.with_source(source.name(), |m| m.record_page());

        if let Err(e) = page.wait_for_selector(source.result_selector()) {
            // Extraction may still find something; the regex sweep needs no DOM
            warn!("{}: result listing never appeared: {}", source.name(), e);
        }

        self.paginate(source, &page)?;

        let html = page.content()?;
        let page_url = page.current_url();
        let _ = page.tab().close(true);

        let mut urls = sources::resolve_urls(&page_url, source.extract_image_urls(&html));
        stats.images_found = urls.len();
        self.metrics
            .with_source(source.name(), |m| m.record_found(urls.len()));
        if urls.len() > self.config.max_images_per_keyword {
            urls.truncate(self.config.max_images_per_keyword);
        }
        info!(
            "{}: {} image urls for '{}'",
            source.name(),
            urls.len(),
            keyword
        );

        let dir: PathBuf = [
            self.config.download_dir.as_str(),
            self.config.category.as_str(),
            &keywords::folder_name(keyword),
        ]
        .iter()
        .collect();
        let mut store = ImageStore::open(dir)?;

        let referer = origin_of(&page_url);
        self.download_all(source.name(), &urls, referer.as_deref(), &mut store, &mut stats)
            .await;

        Ok(stats)
    }

    /// Runs the source's pagination policy the configured number of rounds.
    /// Sources that run out of results end early.
    fn paginate(&self, source: &dyn ImageSource, page: &BrowserPage) -> Result<(), CrawlError> {
        for round in 0..self.config.pagination_rounds {
            match source.pagination() {
                PaginationPolicy::ScrollToBottom => {
                    page.scroll_to_bottom()?;
                }
                PaginationPolicy::ClickMore { selector } => {
                    if !page.click(selector) {
                        info!("{}: no more-results control after round {}", source.name(), round);
                        break;
                    }
                    std::thread::sleep(self.manager.config().settle_delay());
                }
                PaginationPolicy::FollowNextLink { selector } => {
                    let href = match page.attribute(selector, "href") {
                        Some(href) => href,
                        None => {
                            info!("{}: no next link after round {}", source.name(), round);
                            break;
                        }
                    };
                    let next = Url::parse(&page.current_url())
                        .ok()
                        .and_then(|base| base.join(&href).ok())
                        .map(|u| u.to_string())
                        .unwrap_or(href);
                    page.load(&next)?;
                    self.metrics.with_source(source.name(), |m| m.record_page());
                }
            }
        }
        Ok(())
    }

    /// Downloads every URL, skipping duplicates, containing failures per
    /// image.
    async fn download_all(
        &self,
        source_name: &str,
        urls: &[String],
        referer: Option<&str>,
        store: &mut ImageStore,
        stats: &mut SourceProgress,
    ) {
        for url in urls {
            let started = Instant::now();
            let fetched = self.client.get_image_bytes(url, referer).await;
            self.client.rate_limit_delay().await;

            match fetched {
                Ok(Some((bytes, content_type))) => {
                    if !download::looks_like_image(&content_type, &bytes) {
                        warn!("Not an image, skipping {}", url);
                        stats.failures += 1;
                        self.metrics.with_source(source_name, |m| {
                            m.record_failure(format!("non-image body from {}", url))
                        });
                        continue;
                    }
                    match store.store(url, &bytes, &content_type) {
                        Ok(Some(image)) => {
                            stats.images_downloaded += 1;
                            self.metrics.with_source(source_name, |m| {
                                m.record_download(image.bytes, started.elapsed())
                            });
                            log::debug!("Saved {}", image.path);
                        }
                        Ok(None) => {
                            stats.duplicates_skipped += 1;
                            self.metrics
                                .with_source(source_name, |m| m.record_duplicate());
                        }
                        Err(e) => {
                            error!("Write failed for {}: {}", url, e);
                            stats.failures += 1;
                            self.metrics
                                .with_source(source_name, |m| m.record_failure(e.to_string()));
                        }
                    }
                }
                Ok(None) => {
                    stats.failures += 1;
                    self.metrics
                        .with_source(source_name, |m| m.record_failure(format!("bad status for {}", url)));
                }
                Err(e) => {
                    error!("Download failed for {}: {}", url, e);
                    stats.failures += 1;
                    self.metrics
                        .with_source(source_name, |m| m.record_failure(e.to_string()));
                }
            }
        }
    }
}

fn origin_of(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    Some(format!("{}://{}", url.scheme(), url.host_str()?))
}
