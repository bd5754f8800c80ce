use scraper::{Html, Selector};

use super::{ImageSource, PaginationPolicy, SearchBox};
use crate::models::SourceId;

/// DuckDuckGo image search. Tiles render behind a content proxy
/// (`external-content.duckduckgo.com/iu/?u=<original>`); the original URL is
/// recovered from the `u` query parameter. More tiles come from the
/// "more results" control.
pub struct DuckDuckGoImages;

/// Pulls the original image URL back out of the DDG proxy wrapper.
fn unwrap_proxy_url(src: &str) -> String {
    if let Some(pos) = src.find("/iu/?u=") {
        let tail = &src[pos + "/iu/?u=".len()..];
        let encoded = tail.split('&').next().unwrap_or(tail);
        if let Ok(decoded) = urlencoding::decode(encoded) {
            return decoded.into_owned();
        }
    }
    src.to_string()
}

impl ImageSource for DuckDuckGoImages {
    fn id(&self) -> SourceId {
        SourceId::DuckDuckGo
    }

    fn search_url(&self, keyword: &str) -> String {
        format!(
            "https://duckduckgo.com/?q={}&iax=images&ia=images",
            urlencoding::encode(keyword)
        )
    }

    fn result_selector(&self) -> &'static str {
        "div.tile--img img"
    }

    fn pagination(&self) -> PaginationPolicy {
        PaginationPolicy::ClickMore {
            selector: "#more-results, .result--more__btn",
        }
    }

    fn extract_image_urls(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut urls = Vec::new();

        let tile_selector = Selector::parse("div.tile--img img, img.tile--img__img").unwrap();
        for element in document.select(&tile_selector) {
            if let Some(src) = element
                .value()
                .attr("src")
                .or_else(|| element.value().attr("data-src"))
            {
                let unwrapped = unwrap_proxy_url(src);
                if !super::is_noise_url(&unwrapped) {
                    urls.push(unwrapped);
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
            home_url: "https://duckduckgo.com/",
            input_selector: "input#searchbox_input, input.search__input",
            submit_selector: "button[type='submit'], input#search_button_homepage",
        })
    }
}
