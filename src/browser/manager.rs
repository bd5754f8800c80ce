use super::config::BrowserConfig;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Owns the Chrome process and hands out tabs.
pub struct BrowserManager {
    browser: Arc<Browser>,
    config: BrowserConfig,
}

impl BrowserManager {
    pub fn new(config: BrowserConfig) -> Result<Self, BrowserError> {
        // Owned argument strings first; LaunchOptions borrows them as OsStr.
        let images_arg = if config.disable_images {
            Some("--blink-settings=imagesEnabled=false".to_string())
        } else {
            None
        };
        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));
        let proxy_arg = config.proxy.as_ref().map(|p| p.to_chrome_arg());
        let ext_arg = match config.proxy.as_ref() {
            Some(p) if p.requires_auth() => {
                let dir = p
                    .write_auth_extension()
                    .map_err(|e| BrowserError::Configuration(e.to_string()))?;
                Some(format!("--load-extension={}", dir.display()))
            }
            _ => None,
        };

        let mut args: Vec<&OsStr> = vec![
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-setuid-sandbox"),
            OsStr::new("--no-first-run"),
            OsStr::new("--no-default-browser-check"),
            OsStr::new("--disable-popup-blocking"),
            OsStr::new("--ignore-certificate-errors"),
        ];
        if let Some(ref arg) = images_arg {
            args.push(OsStr::new(arg));
        }
        if let Some(ref arg) = user_agent_arg {
            args.push(OsStr::new(arg));
        }
        if let Some(ref arg) = proxy_arg {
            args.push(OsStr::new(arg));
        }
        if let Some(ref arg) = ext_arg {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some(config.window_size))
            .args(args)
            .idle_browser_timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| BrowserError::Configuration(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| BrowserError::Initialization(e.to_string()))?;

        Ok(Self {
            browser: Arc::new(browser),
            config,
        })
    }

    /// Open a fresh tab with the configured default timeout.
    pub fn new_tab(&self) -> Result<Arc<Tab>, BrowserError> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| BrowserError::TabCreation(e.to_string()))?;
        tab.set_default_timeout(self.config.timeout());
        Ok(tab)
    }

    pub fn open_tab_count(&self) -> usize {
        self.browser.get_tabs().lock().map(|t| t.len()).unwrap_or(0)
    }

    /// Waits for a window/tab beyond `previous_count` to open, then returns
    /// the newest one. Counterpart of a wait-for-window scoped context.
    pub fn wait_for_new_tab(
        &self,
        previous_count: usize,
        timeout: Duration,
    ) -> Result<Arc<Tab>, BrowserError> {
        let start = Instant::now();
        loop {
            {
                let tabs = self
                    .browser
                    .get_tabs()
                    .lock()
                    .map_err(|_| BrowserError::TabCreation("tab list poisoned".to_string()))?;
                if tabs.len() > previous_count {
                    if let Some(tab) = tabs.last() {
                        return Ok(Arc::clone(tab));
                    }
                }
            }
            if start.elapsed() > timeout {
                return Err(BrowserError::Timeout("waiting for new window".to_string()));
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    pub fn browser(&self) -> &Arc<Browser> {
        &self.browser
    }
}

/// Errors that can occur during browser operations
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("Browser initialization failed: {0}")]
    Initialization(String),

    #[error("Browser configuration error: {0}")]
    Configuration(String),

    #[error("Tab creation failed: {0}")]
    TabCreation(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("JavaScript execution error: {0}")]
    JavaScript(String),

    #[error("Cookie operation failed: {0}")]
    Cookie(String),
}
