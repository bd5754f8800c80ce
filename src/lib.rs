// Library interface for rust_image_scraper
// This allows tests and external crates to use the scraper components

pub mod browser;
pub mod config;
pub mod crawler;
pub mod download;
pub mod http_client;
pub mod keywords;
pub mod metrics;
pub mod models;
pub mod sources;
