/// Per-source crawl metrics
///
/// Tracks page visits, extraction yield and download outcomes for each source

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetrics {
    pub source_name: String,
    pub pages_visited: u64,
    pub images_found: u64,
    pub images_downloaded: u64,
    pub duplicates_skipped: u64,
    pub failures: u64,
    pub bytes_downloaded: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub average_download_ms: f64,
    total_download_ms: u64,
}

impl SourceMetrics {
    pub fn new(source_name: String) -> Self {
        Self {
            source_name,
            pages_visited: 0,
            images_found: 0,
            images_downloaded: 0,
            duplicates_skipped: 0,
            failures: 0,
            bytes_downloaded: 0,
            last_success: None,
            last_failure: None,
            last_error: None,
            average_download_ms: 0.0,
            total_download_ms: 0,
        }
    }

    pub fn record_page(&mut self) {
        self.pages_visited += 1;
    }

    pub fn record_found(&mut self, count: usize) {
        self.images_found += count as u64;
    }

    pub fn record_download(&mut self, bytes: u64, elapsed: Duration) {
        self.images_downloaded += 1;
        self.bytes_downloaded += bytes;
        self.last_success = Some(Utc::now());
        self.total_download_ms += elapsed.as_millis() as u64;
        self.average_download_ms =
            self.total_download_ms as f64 / self.images_downloaded as f64;
    }

    pub fn record_duplicate(&mut self) {
        self.duplicates_skipped += 1;
    }

    pub fn record_failure(&mut self, error: String) {
        self.failures += 1;
        self.last_failure = Some(Utc::now());
        self.last_error = Some(error);
    }

    pub fn download_rate(&self) -> f64 {
        if self.images_found == 0 {
            0.0
        } else {
            (self.images_downloaded as f64 / self.images_found as f64) * 100.0
        }
    }
}

/// Shared tracker keyed by source name.
#[derive(Clone)]
pub struct MetricsTracker {
    metrics: Arc<Mutex<HashMap<String, SourceMetrics>>>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_source<F>(&self, source_name: &str, f: F)
    where
        F: FnOnce(&mut SourceMetrics),
    {
        if let Ok(mut map) = self.metrics.lock() {
            let entry = map
                .entry(source_name.to_string())
                .or_insert_with(|| SourceMetrics::new(source_name.to_string()));
            f(entry);
        }
    }

    pub fn snapshot(&self) -> Vec<SourceMetrics> {
        self.metrics
            .lock()
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    /// One summary log line per source.
    pub fn log_summary(&self) {
        for m in self.snapshot() {
            log::info!(
                "{}: {} pages, {} found, {} downloaded ({:.1}%), {} duplicates, {} failures, {} bytes",
                m.source_name,
                m.pages_visited,
                m.images_found,
                m.images_downloaded,
                m.download_rate(),
                m.duplicates_skipped,
                m.failures,
                m.bytes_downloaded
            );
        }
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_rate() {
        let mut m = SourceMetrics::new("bing".to_string());
        m.record_found(4);
        m.record_download(1000, Duration::from_millis(200));
        m.record_download(3000, Duration::from_millis(400));
        m.record_duplicate();
        m.record_failure("status 404".to_string());

        assert_eq!(m.images_found, 4);
        assert_eq!(m.images_downloaded, 2);
        assert_eq!(m.bytes_downloaded, 4000);
        assert_eq!(m.duplicates_skipped, 1);
        assert_eq!(m.failures, 1);
        assert!((m.download_rate() - 50.0).abs() < f64::EPSILON);
        assert!((m.average_download_ms - 300.0).abs() < f64::EPSILON);
        assert!(m.last_error.as_deref() == Some("status 404"));
    }

    #[test]
    fn test_rate_with_no_finds() {
        let m = SourceMetrics::new("x".to_string());
        assert_eq!(m.download_rate(), 0.0);
    }

    #[test]
    fn test_tracker_accumulates_per_source() {
        let tracker = MetricsTracker::new();
        tracker.with_source("bing", |m| m.record_page());
        tracker.with_source("bing", |m| m.record_page());
        tracker.with_source("duckduckgo", |m| m.record_page());

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.len(), 2);
        let bing = snapshot.iter().find(|m| m.source_name == "bing").unwrap();
        assert_eq!(bing.pages_visited, 2);
    }
}
