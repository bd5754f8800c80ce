use scraper::{Html, Selector};

use super::{ImageSource, PaginationPolicy, SearchBox};
use crate::models::SourceId;

const BASE_URL: &str = "https://www.bing.com";

/// Bing image search. The result grid lazy-loads on scroll; each tile anchor
/// carries a JSON `m` attribute whose `murl` field is the full-size image.
pub struct BingImages;

impl ImageSource for BingImages {
    fn id(&self) -> SourceId {
        SourceId::Bing
    }

    fn search_url(&self, keyword: &str) -> String {
        format!(
            "{}/images/search?q={}",
            BASE_URL,
            urlencoding::encode(keyword)
        )
    }

    fn result_selector(&self) -> &'static str {
        "a.iusc"
    }

    fn pagination(&self) -> PaginationPolicy {
        PaginationPolicy::ScrollToBottom
    }

    fn extract_image_urls(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut urls = Vec::new();

        // Full-size URLs from the tile metadata
        let tile_selector = Selector::parse("a.iusc").unwrap();
        for element in document.select(&tile_selector) {
            if let Some(meta) = element.value().attr("m") {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(meta) {
                    if let Some(murl) = value.get("murl").and_then(|m| m.as_str()) {
                        if !super::is_noise_url(murl) {
                            urls.push(murl.to_string());
                        }
                    }
                }
            }
        }

        // Thumbnails when the metadata attribute is absent
        if urls.is_empty() {
            let thumb_selector = Selector::parse("img.mimg").unwrap();
            for element in document.select(&thumb_selector) {
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
        }

        if urls.is_empty() {
            urls = super::regex_image_urls(html);
        }
        urls
    }

    fn search_box(&self) -> Option<SearchBox> {
        Some(SearchBox {
            home_url: "https://www.bing.com/images",
            input_selector: "input.b_searchbox",
            submit_selector: "input#sb_form_go",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_encodes_keyword() {
        let url = BingImages.search_url("red pandas");
        assert_eq!(url, "https://www.bing.com/images/search?q=red%20pandas");
    }

    #[test]
    fn test_extract_from_tile_metadata() {
        let html = r#"
            <ul class="dgControl_list">
              <li><a class="iusc" m='{"murl":"https://cdn.example.com/full/panda.jpg","turl":"https://tse.example.com/th?id=1"}'></a></li>
              <li><a class="iusc" m='{"murl":"https://cdn.example.com/full/leopard.png"}'></a></li>
              <li><a class="iusc" m='not json'></a></li>
            </ul>
        "#;
        let urls = BingImages.extract_image_urls(html);
        assert_eq!(
            urls,
            vec![
                "https://cdn.example.com/full/panda.jpg",
                "https://cdn.example.com/full/leopard.png"
            ]
        );
    }

    #[test]
    fn test_extract_falls_back_to_thumbnails() {
        let html = r#"
            <div><img class="mimg" src="https://tse.example.com/th/panda-thumb.jpg"></div>
            <div><img class="mimg" data-src="https://tse.example.com/th/leopard-thumb.jpg"></div>
        "#;
        let urls = BingImages.extract_image_urls(html);
        assert_eq!(urls.len(), 2);
        assert!(urls[0].contains("panda-thumb"));
    }

    #[test]
    fn test_pagination_is_scroll() {
        assert_eq!(BingImages.pagination(), PaginationPolicy::ScrollToBottom);
    }
}
