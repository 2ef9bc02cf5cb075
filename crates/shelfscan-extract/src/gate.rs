//! Page applicability gate.
//!
//! Cheap, side-effect-free checks a caller runs before extraction to decide
//! whether the page is worth scanning at all. The pipeline itself never
//! consults the gate.

use scraper::Selector;
use serde::Serialize;

use crate::page::{PageSnapshot, ANALYTICS_META_GLOBAL};

/// URL path segments that mark product or collection pages. Matched as
/// case-sensitive substrings of the raw path.
pub const PRODUCT_PATH_PATTERNS: [&str; 4] = ["/products/", "/collections/", "/product/", "/shop/"];

/// Storefront platforms the gate can fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Shopify,
    WooCommerce,
    BigCommerce,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Shopify => write!(f, "shopify"),
            Platform::WooCommerce => write!(f, "woocommerce"),
            Platform::BigCommerce => write!(f, "bigcommerce"),
        }
    }
}

const SHOPIFY_GLOBALS: [&str; 3] = ["Shopify", "ShopifyAnalytics", ANALYTICS_META_GLOBAL];
const SHOPIFY_HOSTS: [&str; 2] = ["cdn.shopify.com", "shopifycdn.net"];
const SHOPIFY_META_NAMES: [&str; 2] = ["shopify-checkout-api-token", "shopify-digital-wallet"];
const BIGCOMMERCE_HOSTS: [&str; 2] = ["cdn11.bigcommerce.com", "bigcommerce.com/s-"];

/// Identifies the storefront platform from globals, asset hosts and meta
/// markers. Returns `None` when nothing matches.
#[must_use]
pub fn detect_platform(page: &PageSnapshot) -> Option<Platform> {
    let asset_urls = asset_urls(page);
    let references = |hosts: &[&str]| {
        asset_urls
            .iter()
            .any(|src| hosts.iter().any(|host| src.contains(host)))
    };

    if SHOPIFY_GLOBALS.iter().any(|g| page.has_global(g))
        || references(&SHOPIFY_HOSTS)
        || SHOPIFY_META_NAMES.iter().any(|name| has_meta_named(page, name))
    {
        return Some(Platform::Shopify);
    }

    if generator_mentions(page, "woocommerce") || body_has_class(page, "woocommerce") {
        return Some(Platform::WooCommerce);
    }

    if references(&BIGCOMMERCE_HOSTS) {
        return Some(Platform::BigCommerce);
    }

    None
}

/// Returns `true` when the page belongs to a recognized storefront platform.
#[must_use]
pub fn is_known_platform(page: &PageSnapshot) -> bool {
    let platform = detect_platform(page);
    tracing::debug!(url = %page.url(), platform = ?platform, "platform fingerprint");
    platform.is_some()
}

/// Returns `true` when the URL path contains one of
/// [`PRODUCT_PATH_PATTERNS`]. No case folding, no slash normalization.
#[must_use]
pub fn path_matches_product_pattern(page: &PageSnapshot) -> bool {
    let path = page.url().path();
    PRODUCT_PATH_PATTERNS
        .iter()
        .any(|pattern| path.contains(pattern))
}

/// Both gate checks together.
#[must_use]
pub fn should_extract(page: &PageSnapshot) -> bool {
    is_known_platform(page) && path_matches_product_pattern(page)
}

fn select_all<'a>(page: &'a PageSnapshot, css: &str) -> Vec<scraper::ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => page.document().select(&selector).collect(),
        Err(e) => {
            tracing::warn!(selector = css, error = ?e, "invalid gate selector");
            Vec::new()
        }
    }
}

fn asset_urls(page: &PageSnapshot) -> Vec<String> {
    let scripts = select_all(page, "script[src]")
        .into_iter()
        .filter_map(|el| el.value().attr("src"));
    let links = select_all(page, "link[href]")
        .into_iter()
        .filter_map(|el| el.value().attr("href"));
    scripts.chain(links).map(str::to_owned).collect()
}

fn has_meta_named(page: &PageSnapshot, name: &str) -> bool {
    select_all(page, "meta[name], meta[id]").into_iter().any(|el| {
        let value = el.value();
        value.attr("name") == Some(name) || value.attr("id") == Some(name)
    })
}

fn generator_mentions(page: &PageSnapshot, needle: &str) -> bool {
    select_all(page, r#"meta[name="generator"]"#)
        .into_iter()
        .filter_map(|el| el.value().attr("content"))
        .any(|content| content.to_ascii_lowercase().contains(needle))
}

fn body_has_class(page: &PageSnapshot, class: &str) -> bool {
    select_all(page, "body")
        .into_iter()
        .any(|body| body.value().classes().any(|c| c == class))
}
