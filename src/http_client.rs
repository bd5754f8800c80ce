use rand::Rng;
use reqwest::{Client, ClientBuilder, Response};
use std::time::Duration;
use tokio::time::sleep;

use crate::config::HttpSettings;

/// User agents to rotate through to avoid bot detection
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:122.0) Gecko/20100101 Firefox/122.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36 Edg/121.0.0.0",
];

/// Download client with retry, backoff and browser-like headers.
pub struct DownloadClient {
    client: Client,
    settings: HttpSettings,
}

impl DownloadClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_settings(HttpSettings::default())
    }

    pub fn with_settings(settings: HttpSettings) -> Result<Self, reqwest::Error> {
        Self::with_settings_and_proxy(settings, None)
    }

    /// Builds the client, optionally routing through the same proxy the
    /// browser uses.
    pub fn with_settings_and_proxy(
        settings: HttpSettings,
        proxy: Option<reqwest::Proxy>,
    ) -> Result<Self, reqwest::Error> {
        let mut builder = ClientBuilder::new()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(Self::random_user_agent())
            .cookie_store(settings.enable_cookies)
            .gzip(settings.enable_compression)
            .brotli(settings.enable_compression)
            .redirect(reqwest::redirect::Policy::limited(10))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Accept",
            "image/avif,image/webp,image/apng,image/*,*/*;q=0.8"
                .parse()
                .unwrap(),
        );
        headers.insert("Accept-Language", "en-US,en;q=0.9".parse().unwrap());
        headers.insert("DNT", "1".parse().unwrap());
        headers.insert("Connection", "keep-alive".parse().unwrap());
        headers.insert("Sec-Fetch-Dest", "image".parse().unwrap());
        headers.insert("Sec-Fetch-Mode", "no-cors".parse().unwrap());
        headers.insert("Sec-Fetch-Site", "cross-site".parse().unwrap());
        builder = builder.default_headers(headers);
        if let Some(proxy) = proxy {
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;
        Ok(Self { client, settings })
    }

    fn random_user_agent() -> &'static str {
        let mut rng = rand::thread_rng();
        USER_AGENTS[rng.gen_range(0..USER_AGENTS.len())]
    }

    /// Exponential backoff with +-25% jitter.
    fn retry_delay(&self, attempt: usize) -> Duration {
        let base = self.settings.initial_retry_delay_ms;
        let capped = (base * 2u64.pow(attempt as u32)).min(self.settings.max_retry_delay_ms);
        let jitter = rand::thread_rng().gen_range(0.75..=1.25);
        Duration::from_millis((capped as f64 * jitter) as u64)
    }

    fn is_retryable_status(status: reqwest::StatusCode) -> bool {
        matches!(
            status.as_u16(),
            // Rate limiting
            429 |
            // Server errors
            500 | 502 | 503 | 504 |
            // Cloudflare errors
            520 | 521 | 522 | 523 | 524 | 525 | 526 | 527
        )
    }

    /// Fetch a URL with retry, rotating the user agent per attempt. An
    /// optional Referer is sent; image CDNs often require the page origin.
    pub async fn get_with_retry(
        &self,
        url: &str,
        referer: Option<&str>,
    ) -> Result<Response, reqwest::Error> {
        let mut last_error = None;

        for attempt in 0..=self.settings.max_retries {
            let mut request = self
                .client
                .get(url)
                .header("User-Agent", Self::random_user_agent());
            if let Some(referer) = referer {
                request = request.header("Referer", referer);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if Self::is_retryable_status(status) && attempt < self.settings.max_retries {
                        log::warn!(
                            "Retryable status {} for {}, attempt {}/{}",
                            status,
                            url,
                            attempt + 1,
                            self.settings.max_retries + 1
                        );
                        sleep(self.retry_delay(attempt)).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(e) => {
                    let should_retry = e.is_timeout() || e.is_connect() || e.is_request();
                    if should_retry && attempt < self.settings.max_retries {
                        log::warn!(
                            "Request failed for {}, attempt {}/{}: {}",
                            url,
                            attempt + 1,
                            self.settings.max_retries + 1,
                            e
                        );
                        sleep(self.retry_delay(attempt)).await;
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap())
    }

    /// Fetch a URL and return (body, content-type) for success statuses.
    /// Error statuses are reported as `Ok(None)` so callers can log and move on.
    pub async fn get_image_bytes(
        &self,
        url: &str,
        referer: Option<&str>,
    ) -> Result<Option<(Vec<u8>, String)>, reqwest::Error> {
        let response = self.get_with_retry(url, referer).await?;
        if !response.status().is_success() {
            log::warn!("Skipping {}: status {}", url, response.status());
            return Ok(None);
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let bytes = response.bytes().await?;
        Ok(Some((bytes.to_vec(), content_type)))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Pause between downloads; call after each request.
    pub async fn rate_limit_delay(&self) {
        sleep(Duration::from_millis(self.settings.rate_limit_delay_ms)).await;
    }
}
