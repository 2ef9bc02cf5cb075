//! Strategy 3: schema.org JSON-LD extraction.

use serde_json::Value;

use crate::candidate::{CandidateSource, RawCandidate};
use crate::error::ExtractError;
use crate::page::PageSnapshot;
use crate::parse_helpers::{slugify, value_as_id};

use super::{parse_selector, Extractor};

/// The availability URI an offer must carry to count as in stock.
pub const SCHEMA_IN_STOCK: &str = "https://schema.org/InStock";

const JSONLD_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

/// Extracts `Product` items from `<script type="application/ld+json">`
/// blocks. Prices in offers are already in major units.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLdExtractor;

impl Extractor for JsonLdExtractor {
    fn source(&self) -> CandidateSource {
        CandidateSource::StructuredData
    }

    fn extract(&self, page: &PageSnapshot) -> Result<Vec<RawCandidate>, ExtractError> {
        let selector = parse_selector(JSONLD_SELECTOR)?;
        let mut results = Vec::new();

        for (block_idx, script) in page.document().select(&selector).enumerate() {
            let json_text: String = script.text().collect();
            let value: Value = match serde_json::from_str(json_text.trim()) {
                Ok(v) => v,
                Err(e) => {
                    // One broken block must not hide the others.
                    tracing::debug!(block_idx, error = %e, "skipping unparsable JSON-LD block");
                    continue;
                }
            };

            for item in expand_items(value) {
                if let Some(candidate) = product_item_to_candidate(&item) {
                    results.push(candidate);
                }
            }
        }

        Ok(results)
    }
}

/// Flattens a top-level object, array, or `@graph` container into items.
fn expand_items(value: Value) -> Vec<Value> {
    let mut items = match value {
        Value::Array(arr) => arr,
        other => vec![other],
    };

    // Many sites wrap structured data inside {"@graph": [...]}.
    let expanded: Vec<Value> = items
        .iter()
        .filter_map(|item| item.get("@graph").and_then(Value::as_array))
        .flatten()
        .cloned()
        .collect();
    items.extend(expanded);
    items
}

fn is_product_type(item: &Value) -> bool {
    match item.get("@type") {
        Some(Value::String(s)) => s.eq_ignore_ascii_case("Product"),
        // `@type` may be an array, e.g. ["Product", "Thing"].
        Some(Value::Array(arr)) => arr
            .iter()
            .filter_map(Value::as_str)
            .any(|s| s.eq_ignore_ascii_case("Product")),
        _ => false,
    }
}

/// Convert one JSON-LD item to a candidate if it declares itself a Product.
fn product_item_to_candidate(item: &Value) -> Option<RawCandidate> {
    if !is_product_type(item) {
        return None;
    }

    let mut candidate = RawCandidate::new(CandidateSource::StructuredData);
    let name = item.get("name").and_then(Value::as_str).map(str::trim);

    let id = ["productID", "sku", "@id"]
        .iter()
        .find_map(|key| item.get(*key).and_then(value_as_id))
        .or_else(|| {
            name.map(slugify)
                .filter(|slug| !slug.is_empty())
                .map(|slug| format!("jsonld-{slug}"))
        });
    candidate.insert_opt("id", id);
    candidate.insert_opt("title", name);
    candidate.insert_opt(
        "description",
        item.get("description").and_then(Value::as_str),
    );
    candidate.insert_opt("brand", brand_name(item.get("brand")));
    candidate.insert_opt("category", item.get("category").and_then(Value::as_str));
    candidate.insert_opt("url", item.get("url").and_then(Value::as_str));

    let images = image_urls(item.get("image"));
    if let Some(first) = images.first() {
        candidate.fields.insert("image".into(), Value::from(first.clone()));
    }
    if !images.is_empty() {
        candidate.fields.insert("images".into(), Value::from(images));
    }

    if let Some(offer) = primary_offer(item.get("offers")) {
        let price = offer
            .get("price")
            .or_else(|| offer.get("lowPrice"))
            .or_else(|| {
                offer
                    .get("priceSpecification")
                    .and_then(|spec| spec.get("price"))
            })
            .filter(|v| !v.is_null())
            .cloned();
        candidate.insert_opt("price", price);
        candidate.insert_opt("currency", offer.get("priceCurrency").and_then(Value::as_str));
        if let Some(availability) = offer.get("availability").and_then(Value::as_str) {
            candidate
                .fields
                .insert("available".into(), Value::Bool(is_in_stock(availability)));
        }
    }

    Some(candidate)
}

/// `offers` may be a single Offer, an AggregateOffer, or an array of offers
/// (first one wins).
fn primary_offer(offers: Option<&Value>) -> Option<&Value> {
    match offers? {
        Value::Array(arr) => arr.iter().find(|o| o.is_object()),
        obj @ Value::Object(_) => Some(obj),
        _ => None,
    }
}

fn is_in_stock(availability: &str) -> bool {
    let availability = availability.trim();
    availability == SCHEMA_IN_STOCK
        || availability
            .strip_prefix("http://")
            .is_some_and(|rest| Some(rest) == SCHEMA_IN_STOCK.strip_prefix("https://"))
}

fn brand_name(brand: Option<&Value>) -> Option<&str> {
    let name = match brand? {
        Value::String(s) => Some(s.as_str()),
        obj @ Value::Object(_) => obj.get("name").and_then(Value::as_str),
        _ => None,
    };
    name.map(str::trim).filter(|s| !s.is_empty())
}

/// `image` may be a URL string, an `ImageObject`, or an array of either.
fn image_urls(image: Option<&Value>) -> Vec<String> {
    fn one(value: &Value) -> Option<String> {
        let url = match value {
            Value::String(s) => Some(s.as_str()),
            Value::Object(_) => value
                .get("url")
                .or_else(|| value.get("contentUrl"))
                .and_then(Value::as_str),
            _ => None,
        };
        url.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    }

    match image {
        Some(Value::Array(arr)) => arr.iter().filter_map(one).collect(),
        Some(value) => one(value).into_iter().collect(),
        None => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(html: &str) -> PageSnapshot {
        PageSnapshot::from_html("https://drinkhi.com/products/hi-boy", html).unwrap()
    }

    fn extract(html: &str) -> Vec<RawCandidate> {
        JsonLdExtractor.extract(&page(html)).unwrap()
    }

    #[test]
    fn extracts_product_with_offer() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">
            {
                "@context": "https://schema.org",
                "@type": "Product",
                "productID": "json-ld-1",
                "name": "Hi Boy Blood Orange",
                "description": "A sparkling beverage.",
                "brand": {"@type": "Brand", "name": "Hi"},
                "image": ["https://cdn.example.com/a.png", {"@type": "ImageObject", "url": "https://cdn.example.com/b.png"}],
                "url": "https://drinkhi.com/products/hi-boy",
                "offers": {
                    "@type": "Offer",
                    "price": "149.99",
                    "priceCurrency": "USD",
                    "availability": "https://schema.org/InStock"
                }
            }
            </script>
            </head></html>
        "#;

        let out = extract(html);
        assert_eq!(out.len(), 1);
        let c = &out[0];
        assert_eq!(c.source, CandidateSource::StructuredData);
        assert_eq!(c.get("id"), Some(&json!("json-ld-1")));
        assert_eq!(c.get("title"), Some(&json!("Hi Boy Blood Orange")));
        assert_eq!(c.get("brand"), Some(&json!("Hi")));
        assert_eq!(c.get("price"), Some(&json!("149.99")));
        assert_eq!(c.get("currency"), Some(&json!("USD")));
        assert_eq!(c.get("available"), Some(&json!(true)));
        assert_eq!(c.get("image"), Some(&json!("https://cdn.example.com/a.png")));
        assert_eq!(
            c.get("images"),
            Some(&json!(["https://cdn.example.com/a.png", "https://cdn.example.com/b.png"]))
        );
    }

    #[test]
    fn out_of_stock_uri_marks_unavailable() {
        let html = r#"<script type="application/ld+json">
            {"@type": "Product", "sku": "S1", "name": "Gone",
             "offers": {"price": 5, "availability": "https://schema.org/OutOfStock"}}
        </script>"#;
        let out = extract(html);
        assert_eq!(out[0].get("available"), Some(&json!(false)));
        assert_eq!(out[0].get("id"), Some(&json!("S1")));
    }

    #[test]
    fn http_scheme_in_stock_uri_is_accepted() {
        assert!(is_in_stock("http://schema.org/InStock"));
        assert!(is_in_stock(SCHEMA_IN_STOCK));
        assert!(!is_in_stock("InStock"));
        assert!(!is_in_stock("https://schema.org/PreOrder"));
    }

    #[test]
    fn missing_availability_leaves_flag_unset() {
        let html = r#"<script type="application/ld+json">
            {"@type": "Product", "name": "No Availability", "offers": {"price": "3.00"}}
        </script>"#;
        let out = extract(html);
        assert!(out[0].get("available").is_none());
    }

    #[test]
    fn malformed_block_does_not_suppress_following_block() {
        let html = r#"
            <script type="application/ld+json">{"@type": "Product", "name": broken</script>
            <script type="application/ld+json">{"@type": "Product", "name": "Survivor", "offers": {"price": "9.99"}}</script>
        "#;
        let out = extract(html);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("title"), Some(&json!("Survivor")));
    }

    #[test]
    fn graph_container_and_non_products_are_handled() {
        let html = r#"<script type="application/ld+json">
            {"@context": "https://schema.org", "@graph": [
                {"@type": "Organization", "name": "Hi Beverages"},
                {"@type": ["Product", "Thing"], "name": "Graph Product",
                 "offers": [{"@type": "Offer", "price": 12}]}
            ]}
        </script>"#;
        let out = extract(html);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("title"), Some(&json!("Graph Product")));
        assert_eq!(out[0].get("price"), Some(&json!(12)));
    }

    #[test]
    fn aggregate_offer_uses_low_price() {
        let html = r#"<script type="application/ld+json">
            {"@type": "Product", "name": "Variety Pack",
             "offers": {"@type": "AggregateOffer", "lowPrice": "19.99", "highPrice": "39.99"}}
        </script>"#;
        let out = extract(html);
        assert_eq!(out[0].get("price"), Some(&json!("19.99")));
    }

    #[test]
    fn id_falls_back_to_slugged_name() {
        let html = r#"<script type="application/ld+json">
            {"@type": "Product", "name": "Hi Boy Blood Orange"}
        </script>"#;
        let out = extract(html);
        assert_eq!(out[0].get("id"), Some(&json!("jsonld-hi-boy-blood-orange")));
    }

    #[test]
    fn page_without_jsonld_yields_nothing() {
        assert!(extract("<html><body><p>Nothing here</p></body></html>").is_empty());
    }
}
