use serde::{Deserialize, Serialize};

/// Currency code used when a source does not declare one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Category label used when a source carries no product type.
pub const DEFAULT_CATEGORY: &str = "General";

/// Stock state derived from a product's top-level flag and its variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    InStock,
    /// Some, but not all, variants can be purchased.
    Limited,
    OutOfStock,
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::InStock => write!(f, "in_stock"),
            Availability::Limited => write!(f, "limited"),
            Availability::OutOfStock => write!(f, "out_of_stock"),
        }
    }
}

/// A product recovered from a storefront page, normalized so records from
/// analytics globals, JSON-LD and DOM scraping look the same to consumers.
///
/// Serialized in camelCase (`originalPrice`, `discountPercentage`) for the
/// presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique within one extraction result.
    pub id: String,
    pub title: String,
    /// Plain text or raw HTML, exactly as the source provided it.
    #[serde(default)]
    pub description: String,
    /// Price in major currency units (e.g. dollars). Never negative.
    pub price: f64,
    /// Pre-discount reference price; only set when it exceeds `price`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    /// Derived from `original_price`, never read from a source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<u8>,
    pub currency: String,
    /// Featured image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub category: String,
    /// Set-like: no duplicates, order carries no meaning.
    #[serde(default)]
    pub tags: Vec<String>,
    pub availability: Availability,
    pub url: String,
}

impl Product {
    /// Returns `true` when a pre-discount price is known.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        self.discount_percentage.is_some()
    }

    /// Returns `true` if at least one variant can currently be bought.
    #[must_use]
    pub fn is_purchasable(&self) -> bool {
        self.availability != Availability::OutOfStock
    }

    /// Returns `true` if the product carries `tag`, ignoring ASCII case.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
