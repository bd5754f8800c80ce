use headless_chrome::protocol::cdp::Network::{CookieParam, DeleteCookies};
use headless_chrome::protocol::cdp::{Network, Page};
use headless_chrome::Tab;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use super::manager::BrowserError;

/// Generic page-interaction wrapper around a tab: navigation, clicking,
/// form filling, text/attribute reads, waits, cookies, dialogs.
///
/// Element-lookup misses log a warning and report `false`/empty rather than
/// erroring; callers mostly ignore the result and move on.
pub struct BrowserPage {
    tab: Arc<Tab>,
    default_timeout: Duration,
    settle_delay: Duration,
}

impl BrowserPage {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self {
            tab,
            default_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_millis(1500),
        }
    }

    pub fn with_timings(tab: Arc<Tab>, timeout: Duration, settle_delay: Duration) -> Self {
        Self {
            tab,
            default_timeout: timeout,
            settle_delay,
        }
    }

    /// Navigate and wait for the load to finish, then settle and swallow any
    /// alert the page throws on arrival.
    pub fn load(&self, url: &str) -> Result<(), BrowserError> {
        self.tab
            .navigate_to(url)
            .map_err(|e| BrowserError::Navigation(format!("navigate to {}: {}", url, e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| BrowserError::Navigation(format!("load timeout for {}: {}", url, e)))?;
        std::thread::sleep(self.settle_delay);
        self.accept_dialogs();
        Ok(())
    }

    pub fn current_url(&self) -> String {
        self.tab.get_url()
    }

    pub fn title(&self) -> Result<String, BrowserError> {
        self.tab
            .get_title()
            .map_err(|e| BrowserError::JavaScript(e.to_string()))
    }

    /// Rendered HTML of the current document.
    pub fn content(&self) -> Result<String, BrowserError> {
        self.tab
            .get_content()
            .map_err(|e| BrowserError::JavaScript(e.to_string()))
    }

    pub fn wait_for_selector(&self, selector: &str) -> Result<(), BrowserError> {
        self.wait_for_selector_with_timeout(selector, self.default_timeout)
    }

    pub fn wait_for_selector_with_timeout(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map(|_| ())
            .map_err(|_| BrowserError::Timeout(format!("selector {}", selector)))
    }

    /// Clicks an element. Works with buttons and links.
    pub fn click(&self, selector: &str) -> bool {
        match self.tab.find_element(selector) {
            Ok(element) => {
                let clicked = element
                    .scroll_into_view()
                    .and_then(|e| e.click())
                    .is_ok();
                if clicked {
                    self.accept_dialogs();
                } else {
                    log::warn!("Click failed on {}", selector);
                }
                clicked
            }
            Err(_) => {
                log::warn!("Element not found: {}", selector);
                false
            }
        }
    }

    /// Click and wait for the resulting navigation in the same window.
    pub fn click_and_wait(&self, selector: &str) -> Result<(), BrowserError> {
        if !self.click(selector) {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        self.tab
            .wait_until_navigated()
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;
        std::thread::sleep(self.settle_delay);
        Ok(())
    }

    /// Sets the text of an input field, clearing what was there.
    pub fn fill(&self, selector: &str, text: &str) -> bool {
        match self.tab.find_element(selector) {
            Ok(element) => {
                let ok = element
                    .click()
                    .and_then(|e| e.focus())
                    .is_ok()
                    && self
                        .tab
                        .evaluate(
                            &format!(
                                "document.querySelector('{}').value = '';",
                                selector.replace('\'', "\\'")
                            ),
                            false,
                        )
                        .is_ok()
                    && element.type_into(text).is_ok();
                if !ok {
                    log::warn!("Could not fill {}", selector);
                }
                ok
            }
            Err(_) => {
                log::warn!("Field not found: {}", selector);
                false
            }
        }
    }

    /// Text of all elements matching a selector, de-duplicated and joined
    /// with '|'. Empty string when nothing matches.
    pub fn read_text(&self, selector: &str) -> String {
        let elements = match self.tab.find_elements(selector) {
            Ok(elements) => elements,
            Err(_) => {
                log::warn!("Text not found: {}", selector);
                return String::new();
            }
        };
        let mut seen = BTreeSet::new();
        for element in elements {
            if let Ok(text) = element.get_inner_text() {
                let text = text.trim().to_string();
                if !text.is_empty() {
                    seen.insert(text);
                }
            }
        }
        seen.into_iter().collect::<Vec<_>>().join("|")
    }

    /// Attribute value of the first element matching a selector.
    pub fn attribute(&self, selector: &str, name: &str) -> Option<String> {
        match self.tab.find_element(selector) {
            Ok(element) => element.get_attribute_value(name).ok().flatten(),
            Err(_) => {
                log::warn!("Attribute source not found: {}", selector);
                None
            }
        }
    }

    /// Number of elements matching a selector.
    pub fn element_count(&self, selector: &str) -> usize {
        self.tab
            .find_elements(selector)
            .map(|e| e.len())
            .unwrap_or(0)
    }

    /// Scroll to the bottom of the page, then settle so lazy-loaded content
    /// can attach.
    pub fn scroll_to_bottom(&self) -> Result<(), BrowserError> {
        self.tab
            .evaluate("window.scrollTo(0, document.body.scrollHeight);", false)
            .map_err(|e| BrowserError::JavaScript(format!("scroll failed: {}", e)))?;
        std::thread::sleep(self.settle_delay);
        Ok(())
    }

    pub fn evaluate(&self, script: &str) -> Result<Option<serde_json::Value>, BrowserError> {
        self.tab
            .evaluate(script, false)
            .map(|remote| remote.value)
            .map_err(|e| BrowserError::JavaScript(e.to_string()))
    }

    /// Best-effort acceptance of a JavaScript dialog; no-op when none is open.
    pub fn accept_dialogs(&self) {
        let result = self.tab.call_method(Page::HandleJavaScriptDialog {
            accept: true,
            prompt_text: None,
        });
        if result.is_ok() {
            log::debug!("Accepted a JavaScript dialog");
        }
    }

    pub fn cookies(&self) -> Result<Vec<Network::Cookie>, BrowserError> {
        self.tab
            .get_cookies()
            .map_err(|e| BrowserError::Cookie(e.to_string()))
    }

    pub fn add_cookie(
        &self,
        name: &str,
        value: &str,
        domain: &str,
    ) -> Result<(), BrowserError> {
        self.tab
            .set_cookies(vec![CookieParam {
                name: name.to_string(),
                value: value.to_string(),
                url: None,
                domain: Some(domain.to_string()),
                path: Some("/".to_string()),
                secure: None,
                http_only: None,
                same_site: None,
                expires: None,
                priority: None,
                same_party: None,
                source_scheme: None,
                source_port: None,
                partition_key: None,
            }])
            .map_err(|e| BrowserError::Cookie(e.to_string()))
    }

    /// Deletes every cookie the tab currently sees.
    pub fn clear_cookies(&self) -> Result<(), BrowserError> {
        let cookies = self.cookies()?;
        let deletions: Vec<DeleteCookies> = cookies
            .into_iter()
            .map(|c| DeleteCookies {
                name: c.name,
                url: None,
                domain: Some(c.domain),
                path: Some(c.path),
                partition_key: None,
            })
            .collect();
        if deletions.is_empty() {
            return Ok(());
        }
        self.tab
            .delete_cookies(deletions)
            .map_err(|e| BrowserError::Cookie(e.to_string()))
    }

    pub fn screenshot(&self, path: &str) -> Result<(), BrowserError> {
        let data = self
            .tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| BrowserError::JavaScript(format!("screenshot failed: {}", e)))?;
        std::fs::write(path, data)
            .map_err(|e| BrowserError::JavaScript(format!("screenshot write failed: {}", e)))?;
        Ok(())
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{BrowserConfig, BrowserManager};

    fn page(manager: &BrowserManager) -> BrowserPage {
        BrowserPage::with_timings(
            manager.new_tab().unwrap(),
            manager.config().timeout(),
            Duration::from_millis(100),
        )
    }

    #[test]
    #[ignore] // Requires Chrome to be installed
    fn test_navigation_and_content() {
        let manager = BrowserManager::new(BrowserConfig::default()).unwrap();
        let page = page(&manager);
        page.load("https://example.com").unwrap();
        let html = page.content().unwrap();
        assert!(html.contains("Example"));
        assert_eq!(page.element_count("h1"), 1);
    }

    #[test]
    #[ignore] // Requires Chrome to be installed
    fn test_read_text_and_missing_selector() {
        let manager = BrowserManager::new(BrowserConfig::default()).unwrap();
        let page = page(&manager);
        page.load("https://example.com").unwrap();
        assert!(page.read_text("h1").contains("Example"));
        assert_eq!(page.read_text("div.does-not-exist"), "");
        assert!(!page.click("div.does-not-exist"));
    }

    #[test]
    #[ignore] // Requires Chrome to be installed
    fn test_cookie_roundtrip() {
        let manager = BrowserManager::new(BrowserConfig::default()).unwrap();
        let page = page(&manager);
        page.load("https://example.com").unwrap();
        page.add_cookie("crawl_session", "1", "example.com").unwrap();
        assert!(page.cookies().unwrap().iter().any(|c| c.name == "crawl_session"));
        page.clear_cookies().unwrap();
        assert!(page.cookies().unwrap().is_empty());
    }
}
