/// Browser page tests
/// These tests require Chrome/Chromium to be installed
/// Run with: cargo test --test browser_page_tests -- --ignored
use rust_image_scraper::browser::{BrowserConfig, BrowserManager, BrowserPage};
use std::time::Duration;

fn manager() -> BrowserManager {
    BrowserManager::new(BrowserConfig::default()).expect("Chrome/Chromium not installed")
}

fn open_page(manager: &BrowserManager) -> BrowserPage {
    BrowserPage::with_timings(
        manager.new_tab().unwrap(),
        Duration::from_secs(15),
        Duration::from_millis(200),
    )
}

#[test]
#[ignore] // Requires Chrome/Chromium
fn test_manager_creation() {
    let manager = manager();
    assert!(manager.new_tab().is_ok());
}

#[test]
#[ignore] // Requires Chrome/Chromium and internet
fn test_load_and_read() {
    let manager = manager();
    let page = open_page(&manager);
    page.load("https://example.com").unwrap();

    assert!(page.content().unwrap().contains("Example Domain"));
    assert!(page.read_text("h1").contains("Example"));
    assert_eq!(page.element_count("h1"), 1);
    assert_eq!(page.element_count("div.nope"), 0);
    assert!(page.attribute("a", "href").is_some());
}

#[test]
#[ignore] // Requires Chrome/Chromium and internet
fn test_scroll_and_dialogs_are_harmless() {
    let manager = manager();
    let page = open_page(&manager);
    page.load("https://example.com").unwrap();

    // No dialog open and nothing to scroll: both must be no-ops
    page.accept_dialogs();
    assert!(page.scroll_to_bottom().is_ok());
}

#[test]
#[ignore] // Requires Chrome/Chromium and internet
fn test_cookie_management() {
    let manager = manager();
    let page = open_page(&manager);
    page.load("https://example.com").unwrap();

    page.add_cookie("crawl_session", "abc", "example.com").unwrap();
    let cookies = page.cookies().unwrap();
    assert!(cookies.iter().any(|c| c.name == "crawl_session" && c.value == "abc"));

    page.clear_cookies().unwrap();
    assert!(page.cookies().unwrap().is_empty());
}

#[test]
#[ignore] // Requires Chrome/Chromium
fn test_wait_for_new_window() {
    let manager = manager();
    let page = open_page(&manager);
    page.load("https://example.com").unwrap();

    let before = manager.open_tab_count();
    page.evaluate("window.open('https://example.com/#two');").unwrap();
    let tab = manager
        .wait_for_new_tab(before, Duration::from_secs(10))
        .unwrap();
    assert!(tab.get_url().contains("example.com"));
}
