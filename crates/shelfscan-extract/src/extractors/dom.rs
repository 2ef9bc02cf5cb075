//! Strategy 4: DOM heuristics over product tiles.
//!
//! Last resort for pages exposing no machine-readable product data. Looks
//! for elements carrying a product-identifier attribute and probes each
//! one with ordered candidate selectors, the way common Shopify themes
//! (Dawn, Debut, Impulse) lay out product cards.

use scraper::{ElementRef, Selector};
use serde_json::Value;

use crate::candidate::{CandidateSource, RawCandidate};
use crate::error::ExtractError;
use crate::page::PageSnapshot;
use crate::parse_helpers::{parse_price_text, slugify};

use super::{parse_selector, Extractor};

/// Elements tagged with this attribute are treated as product tiles.
pub const PRODUCT_ELEMENT_SELECTOR: &str = "[data-product-id]";

const PRODUCT_ID_ATTR: &str = "data-product-id";

/// Upper bound on tiles examined per page. Collection pages can render
/// thousands of tiles; the first few are enough for a recommendation.
pub const MAX_DOM_PRODUCTS: usize = 10;

/// Tried in order; the first match with non-empty text wins.
const TITLE_SELECTORS: &[&str] = &[
    ".product-title",
    ".product__title",
    ".product-card__title",
    ".product-item__title",
    ".card__heading",
    "[itemprop=\"name\"]",
    "h2",
    "h3",
];

/// Tried in order; the first match whose text parses as a number wins.
const PRICE_SELECTORS: &[&str] = &[
    ".price-item--sale",
    ".price__sale",
    ".product-price",
    ".price",
    ".money",
    "[itemprop=\"price\"]",
    "[data-price]",
];

/// `src` first, then the attributes lazy-loading themes use.
const IMAGE_ATTRS: &[&str] = &["src", "data-src", "data-srcset", "srcset"];

/// Scrapes product tiles out of the page DOM.
#[derive(Debug, Clone, Copy)]
pub struct DomExtractor {
    max_elements: usize,
}

impl Default for DomExtractor {
    fn default() -> Self {
        Self {
            max_elements: MAX_DOM_PRODUCTS,
        }
    }
}

impl DomExtractor {
    /// Creates an extractor examining at most `max_elements` tiles.
    #[must_use]
    pub fn with_limit(max_elements: usize) -> Self {
        Self { max_elements }
    }
}

/// Pre-parsed selectors for one extraction pass.
struct TileSelectors {
    titles: Vec<Selector>,
    prices: Vec<Selector>,
    image: Selector,
    link: Selector,
}

impl TileSelectors {
    fn parse() -> Result<Self, ExtractError> {
        Ok(Self {
            titles: TITLE_SELECTORS
                .iter()
                .map(|css| parse_selector(css))
                .collect::<Result<_, _>>()?,
            prices: PRICE_SELECTORS
                .iter()
                .map(|css| parse_selector(css))
                .collect::<Result<_, _>>()?,
            image: parse_selector("img")?,
            link: parse_selector("a[href]")?,
        })
    }
}

impl Extractor for DomExtractor {
    fn source(&self) -> CandidateSource {
        CandidateSource::DomHeuristic
    }

    fn extract(&self, page: &PageSnapshot) -> Result<Vec<RawCandidate>, ExtractError> {
        let tiles = parse_selector(PRODUCT_ELEMENT_SELECTOR)?;
        let selectors = TileSelectors::parse()?;

        let candidates = page
            .document()
            .select(&tiles)
            .take(self.max_elements)
            .filter_map(|tile| tile_to_candidate(tile, &selectors, page))
            .collect();
        Ok(candidates)
    }
}

fn tile_to_candidate(
    tile: ElementRef<'_>,
    selectors: &TileSelectors,
    page: &PageSnapshot,
) -> Option<RawCandidate> {
    let Some(title) = find_title(tile, &selectors.titles) else {
        tracing::debug!(
            product_id = tile.value().attr(PRODUCT_ID_ATTR),
            "skipping product tile without a title"
        );
        return None;
    };
    let slug = slugify(&title);

    let id = tile
        .value()
        .attr(PRODUCT_ID_ATTR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| format!("dom-{slug}"), str::to_owned);

    let url = tile
        .select(&selectors.link)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty() && !href.starts_with('#') && !href.starts_with("javascript:"))
        .and_then(|href| page.resolve(href))
        .unwrap_or_else(|| format!("{}/products/{slug}", page.origin()));

    let mut candidate = RawCandidate::new(CandidateSource::DomHeuristic)
        .with("id", id)
        .with("title", title)
        .with("url", url);
    candidate.insert_opt("price", find_price(tile, &selectors.prices));
    candidate.insert_opt("image", find_image(tile, &selectors.image, page).map(Value::from));
    Some(candidate)
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn find_title(tile: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors
        .iter()
        .flat_map(|selector| tile.select(selector))
        .map(element_text)
        .find(|text| !text.is_empty())
}

fn find_price(tile: ElementRef<'_>, selectors: &[Selector]) -> Option<f64> {
    selectors
        .iter()
        .flat_map(|selector| tile.select(selector))
        .find_map(|el| parse_price_text(&element_text(el)))
}

fn find_image(tile: ElementRef<'_>, selector: &Selector, page: &PageSnapshot) -> Option<String> {
    let img = tile.select(selector).next()?;
    IMAGE_ATTRS
        .iter()
        .filter_map(|attr| img.value().attr(attr))
        // srcset: "url 300w, url 600w" -> first url
        .filter_map(|value| value.split([',', ' ']).find(|s| !s.is_empty()))
        .find(|src| !src.starts_with("data:"))
        .and_then(|src| page.resolve(src))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(html: &str) -> Vec<RawCandidate> {
        let page =
            PageSnapshot::from_html("https://drinkhi.com/collections/all", html).unwrap();
        DomExtractor::default().extract(&page).unwrap()
    }

    #[test]
    fn extracts_tile_fields() {
        let html = r#"
            <div class="card" data-product-id="987">
              <a href="/products/hi-boy"><img data-src="//cdn.shopify.com/hi-boy.png"></a>
              <h3 class="card__heading">  Hi Boy
                 Blood Orange </h3>
              <span class="price">$12.99</span>
            </div>
        "#;
        let out = extract(html);
        assert_eq!(out.len(), 1);
        let c = &out[0];
        assert_eq!(c.source, CandidateSource::DomHeuristic);
        assert_eq!(c.get("id"), Some(&json!("987")));
        assert_eq!(c.get("title"), Some(&json!("Hi Boy Blood Orange")));
        assert_eq!(c.get("price"), Some(&json!(12.99)));
        assert_eq!(
            c.get("url"),
            Some(&json!("https://drinkhi.com/products/hi-boy"))
        );
        assert_eq!(
            c.get("image"),
            Some(&json!("https://cdn.shopify.com/hi-boy.png"))
        );
    }

    #[test]
    fn title_less_tile_is_skipped() {
        let html = r#"
            <div data-product-id="1"><span class="price">$5.00</span></div>
            <div data-product-id="2"><h2>Kept</h2><span class="price">$6.00</span></div>
        "#;
        let out = extract(html);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("id"), Some(&json!("2")));
    }

    #[test]
    fn first_parseable_price_selector_wins() {
        let html = r#"
            <div data-product-id="3">
              <h2>Variety Pack</h2>
              <span class="product-price">Sold out</span>
              <span class="price">$24.00</span>
            </div>
        "#;
        let out = extract(html);
        assert_eq!(out[0].get("price"), Some(&json!(24.0)));
    }

    #[test]
    fn unparseable_price_leaves_price_unset() {
        let html = r#"<div data-product-id="4"><h2>Mystery</h2><span class="price">Call us</span></div>"#;
        let out = extract(html);
        assert_eq!(out.len(), 1);
        assert!(out[0].get("price").is_none());
    }

    #[test]
    fn missing_link_synthesizes_url_from_origin_and_title() {
        let html = r#"<div data-product-id="5"><h2>Ginger Lemongrass 5mg</h2></div>"#;
        let out = extract(html);
        assert_eq!(
            out[0].get("url"),
            Some(&json!("https://drinkhi.com/products/ginger-lemongrass-5mg"))
        );
    }

    #[test]
    fn blank_identifier_falls_back_to_slug() {
        let html = r#"<div data-product-id=" "><h2>Hi Boy</h2></div>"#;
        let out = extract(html);
        assert_eq!(out[0].get("id"), Some(&json!("dom-hi-boy")));
    }

    #[test]
    fn srcset_uses_first_url() {
        let html = r#"
            <div data-product-id="6"><h2>Tile</h2>
              <img data-srcset="/img/a-300.png 300w, /img/a-600.png 600w">
            </div>
        "#;
        let out = extract(html);
        assert_eq!(
            out[0].get("image"),
            Some(&json!("https://drinkhi.com/img/a-300.png"))
        );
    }

    #[test]
    fn processing_is_capped() {
        let html: String = (0..25)
            .map(|i| format!(r#"<div data-product-id="{i}"><h2>Item {i}</h2></div>"#))
            .collect();
        assert_eq!(extract(&html).len(), MAX_DOM_PRODUCTS);

        let page = PageSnapshot::from_html("https://drinkhi.com/", &html).unwrap();
        let out = DomExtractor::with_limit(3).extract(&page).unwrap();
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn cap_counts_skipped_tiles() {
        let mut html: String = (0..MAX_DOM_PRODUCTS)
            .map(|i| format!(r#"<div data-product-id="{i}"></div>"#))
            .collect();
        html.push_str(r#"<div data-product-id="late"><h2>Too Late</h2></div>"#);
        assert!(extract(&html).is_empty());
    }
}
