use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::models::SourceId;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_download_dir")]
    pub download_dir: String,

    /// Folder segment between the download dir and the keyword folder.
    #[serde(default = "default_category")]
    pub category: String,

    /// Delimited keyword list, one or more keywords per row.
    #[serde(default = "default_keyword_file")]
    pub keyword_file: String,

    /// How many times to trigger each source's pagination policy.
    #[serde(default = "default_pagination_rounds")]
    pub pagination_rounds: usize,

    #[serde(default = "default_max_images")]
    pub max_images_per_keyword: usize,

    /// Source ids to crawl, in order.
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,

    #[serde(default)]
    pub browser: BrowserSettings,

    #[serde(default)]
    pub http: HttpSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowserSettings {
    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Navigation and element-wait timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Disable image rendering; src attributes still populate and pages load faster.
    #[serde(default = "default_true")]
    pub disable_images: bool,

    /// Pause after navigation and after each pagination round, in milliseconds.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    pub user_agent: Option<String>,

    #[serde(default)]
    pub proxy: Option<ProxySettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProxySettings {
    /// host:port, optionally scheme-prefixed (socks5://...).
    pub server: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpSettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_initial_retry_delay")]
    pub initial_retry_delay_ms: u64,

    #[serde(default = "default_max_retry_delay")]
    pub max_retry_delay_ms: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_true")]
    pub enable_cookies: bool,

    #[serde(default = "default_true")]
    pub enable_compression: bool,

    /// Delay between image downloads in milliseconds.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_delay_ms: u64,
}

fn default_true() -> bool {
    true
}
fn default_download_dir() -> String {
    "downloads".to_string()
}
fn default_category() -> String {
    "images".to_string()
}
fn default_keyword_file() -> String {
    "keywordlist.csv".to_string()
}
fn default_pagination_rounds() -> usize {
    3
}
fn default_max_images() -> usize {
    60
}
fn default_sources() -> Vec<String> {
    vec![
        "bing".to_string(),
        "duckduckgo".to_string(),
        "freeimages".to_string(),
    ]
}
fn default_window_width() -> u32 {
    1920
}
fn default_window_height() -> u32 {
    1080
}
fn default_timeout() -> u64 {
    30
}
fn default_settle_delay() -> u64 {
    1500
}
fn default_max_retries() -> usize {
    4
}
fn default_initial_retry_delay() -> u64 {
    500
}
fn default_max_retry_delay() -> u64 {
    8000
}
fn default_rate_limit() -> u64 {
    300
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            timeout_secs: 30,
            disable_images: true,
            settle_delay_ms: 1500,
            user_agent: None,
            proxy: None,
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            max_retries: 4,
            initial_retry_delay_ms: 500,
            max_retry_delay_ms: 8000,
            timeout_secs: 30,
            enable_cookies: true,
            enable_compression: true,
            rate_limit_delay_ms: 300,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            category: default_category(),
            keyword_file: default_keyword_file(),
            pagination_rounds: default_pagination_rounds(),
            max_images_per_keyword: default_max_images(),
            sources: default_sources(),
            browser: BrowserSettings::default(),
            http: HttpSettings::default(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            if let Ok(content) = fs::read_to_string(path) {
                match toml::from_str::<Config>(&content) {
                    Ok(cfg) => return cfg,
                    Err(e) => log::warn!("Invalid {}: {}", path.display(), e),
                }
            }
        }
        Self::default()
    }

    /// Source ids from config, unknown names logged and dropped.
    pub fn enabled_sources(&self) -> Vec<SourceId> {
        self.sources
            .iter()
            .filter_map(|name| {
                let id = SourceId::parse(name);
                if id.is_none() {
                    log::warn!("Unknown source '{}' in config, skipping", name);
                }
                id
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.download_dir, "downloads");
        assert_eq!(cfg.category, "images");
        assert_eq!(cfg.pagination_rounds, 3);
        assert_eq!(cfg.sources.len(), 3);
        assert!(cfg.browser.headless);
        assert!(cfg.browser.proxy.is_none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            download_dir = "pics"
            sources = ["bing"]
            [browser]
            headless = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.download_dir, "pics");
        assert!(!cfg.browser.headless);
        // Unset fields fall back field-wise
        assert_eq!(cfg.browser.window_width, 1920);
        assert_eq!(cfg.http.max_retries, 4);
        assert_eq!(cfg.enabled_sources(), vec![SourceId::Bing]);
    }

    #[test]
    fn test_unknown_source_dropped() {
        let cfg: Config = toml::from_str(r#"sources = ["bing", "altavista"]"#).unwrap();
        assert_eq!(cfg.enabled_sources(), vec![SourceId::Bing]);
    }

    #[test]
    fn test_proxy_settings() {
        let cfg: Config = toml::from_str(
            r#"
            [browser.proxy]
            server = "127.0.0.1:8080"
            username = "u"
            password = "p"
            "#,
        )
        .unwrap();
        let proxy = cfg.browser.proxy.unwrap();
        assert_eq!(proxy.server, "127.0.0.1:8080");
        assert_eq!(proxy.username.as_deref(), Some("u"));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let cfg = Config::load_from(Path::new("/nonexistent/config.toml"));
        assert_eq!(cfg.download_dir, "downloads");
    }
}
