use scraper::{Html, Selector};

use super::{ImageSource, PaginationPolicy};
use crate::models::SourceId;

const BASE_URL: &str = "https://www.freeimages.com";

/// FreeImages stock-photo search. Listings are classic numbered pages; the
/// next page is reached by following the rel=next anchor.
pub struct FreeImages;

impl ImageSource for FreeImages {
    fn id(&self) -> SourceId {
        SourceId::FreeImages
    }

    fn search_url(&self, keyword: &str) -> String {
        // Path-style query, spaces as dashes
        let slug = keyword
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        format!("{}/search/{}", BASE_URL, urlencoding::encode(&slug))
    }

    fn result_selector(&self) -> &'static str {
        "div.grid-container img, article img"
    }

    fn pagination(&self) -> PaginationPolicy {
        PaginationPolicy::FollowNextLink {
            selector: "a[rel='next'], li.pagination-next a",
        }
    }

    fn extract_image_urls(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut urls = Vec::new();

        let selector = Selector::parse("div.grid-container img, article img").unwrap();
        for element in document.select(&selector) {
            if let Some(src) = element
                .value()
                .attr("src")
                .or_else(|| element.value().attr("data-src"))
            {
                if !super::is_noise_url(src) {
                    urls.push(src.to_string());
                }
            }
        }

        if urls.is_empty() {
            urls = super::regex_image_urls(html);
        }
        urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_slugifies() {
        assert_eq!(
            FreeImages.search_url("Mountain  Lake"),
            "https://www.freeimages.com/search/mountain-lake"
        );
    }

    #[test]
    fn test_extract_grid_images() {
        let html = r#"
            <div class="grid-container">
              <img src="https://images.freeimages.com/images/large-previews/abc/lake-1.jpg">
              <img data-src="https://images.freeimages.com/images/large-previews/def/lake-2.jpg">
              <img src="/assets/logo.png">
            </div>
        "#;
        let urls = FreeImages.extract_image_urls(html);
        assert_eq!(urls.len(), 2);
        assert!(urls.iter().all(|u| u.contains("large-previews")));
    }

    #[test]
    fn test_regex_fallback_when_grid_missing() {
        let html = r#"<script>var imgs = ["https://images.freeimages.com/x/waterfall.jpg"];</script>"#;
        let urls = FreeImages.extract_image_urls(html);
        assert_eq!(urls, vec!["https://images.freeimages.com/x/waterfall.jpg"]);
    }

    #[test]
    fn test_pagination_follows_link() {
        match FreeImages.pagination() {
            PaginationPolicy::FollowNextLink { selector } => assert!(selector.contains("next")),
            other => panic!("unexpected policy {:?}", other),
        }
    }
}
