//! Canonical mapping from [`RawCandidate`] to [`shelfscan_core::Product`].
//!
//! The only place source-specific quirks are reconciled: minor-unit prices
//! from the analytics globals, the `title`/`name` split, string-or-array
//! tags, variant-level stock flags. Extractors stay dumb; everything they
//! leave loose is tightened here.

use serde_json::Value;
use shelfscan_core::{Availability, Product, DEFAULT_CATEGORY, DEFAULT_CURRENCY};

use crate::candidate::RawCandidate;
use crate::error::Rejection;
use crate::page::PageSnapshot;
use crate::parse_helpers::{value_as_f64, value_as_id};

const MINOR_UNITS_PER_MAJOR: f64 = 100.0;

/// Maps one raw candidate to a canonical product.
///
/// # Errors
///
/// Returns the first failing [`Rejection`], checked in order: identifier,
/// then title, then price.
pub fn map_candidate(candidate: &RawCandidate, page: &PageSnapshot) -> Result<Product, Rejection> {
    let id = candidate
        .get("id")
        .and_then(value_as_id)
        .ok_or(Rejection::MissingId)?;
    let title = candidate
        .first_str(&["title", "name"])
        .ok_or(Rejection::MissingTitle)?
        .to_owned();

    let scale = if candidate.source.uses_minor_units() {
        MINOR_UNITS_PER_MAJOR
    } else {
        1.0
    };
    let price = first_amount(candidate, &["price", "price_min"])
        .map(|raw| raw / scale)
        .ok_or(Rejection::MissingPrice)?;

    let original_price = first_amount(candidate, &["compare_at_price", "compare_at_price_min"])
        .map(|raw| raw / scale)
        .filter(|original| *original > price);
    let discount_percentage = original_price.map(|original| discount_percent(original, price));

    let (image, images) = collect_images(candidate, page);

    Ok(Product {
        id,
        title,
        description: candidate
            .first_str(&["description", "body_html"])
            .unwrap_or_default()
            .to_owned(),
        price,
        original_price,
        discount_percentage,
        currency: candidate
            .first_str(&["currency", "priceCurrency"])
            .unwrap_or(DEFAULT_CURRENCY)
            .to_owned(),
        image,
        images,
        brand: candidate.first_str(&["vendor", "brand"]).map(str::to_owned),
        category: candidate
            .first_str(&["product_type", "type", "category"])
            .unwrap_or(DEFAULT_CATEGORY)
            .to_owned(),
        tags: collect_tags(candidate.get("tags")),
        availability: derive_availability(candidate),
        url: resolve_url(candidate, page),
    })
}

/// First of `keys` holding a finite, non-negative amount.
fn first_amount(candidate: &RawCandidate, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| candidate.get(key))
        .find_map(|value| value_as_f64(value).filter(|amount| *amount >= 0.0))
}

/// `round(100 * (original - price) / original)`. Callers guarantee
/// `original > price >= 0`, so the result is in `1..=100`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn discount_percent(original: f64, price: f64) -> u8 {
    let pct = (100.0 * (original - price) / original).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Stock state from the top-level flag, then variant flags.
fn derive_availability(candidate: &RawCandidate) -> Availability {
    if candidate.get("available").and_then(Value::as_bool) == Some(false) {
        return Availability::OutOfStock;
    }

    let Some(variants) = candidate
        .get("variants")
        .and_then(Value::as_array)
        .filter(|v| !v.is_empty())
    else {
        return Availability::InStock;
    };

    // A variant without an explicit flag is sellable.
    let sellable = variants
        .iter()
        .filter(|v| v.get("available").and_then(Value::as_bool) != Some(false))
        .count();

    match sellable {
        0 => Availability::OutOfStock,
        n if n < variants.len() => Availability::Limited,
        _ => Availability::InStock,
    }
}

/// Tags arrive either as a JSON array or as Shopify's comma-joined string.
fn collect_tags(raw: Option<&Value>) -> Vec<String> {
    let parts: Vec<&str> = match raw {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(joined)) => joined.split(',').collect(),
        _ => Vec::new(),
    };

    let mut tags: Vec<String> = Vec::with_capacity(parts.len());
    for tag in parts.into_iter().map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_owned());
        }
    }
    tags
}

/// Reads an image reference that may be a bare URL or an object carrying
/// `src`/`url`.
fn image_ref(value: &Value) -> Option<&str> {
    let url = match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(_) => value
            .get("src")
            .or_else(|| value.get("url"))
            .and_then(Value::as_str),
        _ => None,
    };
    url.map(str::trim).filter(|s| !s.is_empty())
}

/// Featured image plus the full list, featured first, without duplicates.
fn collect_images(candidate: &RawCandidate, page: &PageSnapshot) -> (Option<String>, Vec<String>) {
    let featured = ["image", "featured_image"]
        .iter()
        .filter_map(|key| candidate.get(key))
        .find_map(image_ref)
        .and_then(|src| page.resolve(src));

    let mut images: Vec<String> = Vec::new();
    if let Some(featured) = &featured {
        images.push(featured.clone());
    }
    if let Some(Value::Array(list)) = candidate.get("images") {
        for src in list.iter().filter_map(image_ref).filter_map(|s| page.resolve(s)) {
            if !images.contains(&src) {
                images.push(src);
            }
        }
    }

    let image = featured.or_else(|| images.first().cloned());
    (image, images)
}

/// Explicit `url`, else `<origin>/products/<handle>`, else the page itself.
fn resolve_url(candidate: &RawCandidate, page: &PageSnapshot) -> String {
    if let Some(url) = candidate.first_str(&["url"]).and_then(|u| page.resolve(u)) {
        return url;
    }
    if let Some(handle) = candidate.first_str(&["handle"]) {
        return format!("{}/products/{handle}", page.origin());
    }
    page.url().to_string()
}
