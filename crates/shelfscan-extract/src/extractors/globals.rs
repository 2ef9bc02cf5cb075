//! Strategies 1 and 2: storefront analytics globals.

use serde_json::Value;

use crate::candidate::{CandidateSource, RawCandidate};
use crate::error::ExtractError;
use crate::page::{PageSnapshot, ALTERNATE_META_GLOBAL, ANALYTICS_META_GLOBAL};
use crate::parse_helpers::value_as_f64;

use super::Extractor;

/// Slots inside the metadata object that may carry product records.
const PRODUCT_SLOTS: [&str; 2] = ["product", "products"];

/// Reads product records out of a metadata global such as
/// `window.ShopifyAnalytics.meta`.
///
/// A slot holding an object yields one candidate; a slot holding an array
/// yields one per object entry. Prices stay in the minor units the
/// storefront wrote them in.
///
/// Shopify's analytics payload carries no top-level title or price; those
/// are filled in from the variant list when missing.
#[derive(Debug, Clone, Copy)]
pub struct GlobalSlotExtractor {
    global: &'static str,
    source: CandidateSource,
}

impl GlobalSlotExtractor {
    #[must_use]
    pub const fn embedded_analytics() -> Self {
        Self {
            global: ANALYTICS_META_GLOBAL,
            source: CandidateSource::EmbeddedAnalytics,
        }
    }

    #[must_use]
    pub const fn alternate_global() -> Self {
        Self {
            global: ALTERNATE_META_GLOBAL,
            source: CandidateSource::AlternateGlobal,
        }
    }
}

impl Extractor for GlobalSlotExtractor {
    fn source(&self) -> CandidateSource {
        self.source
    }

    fn extract(&self, page: &PageSnapshot) -> Result<Vec<RawCandidate>, ExtractError> {
        let Some(meta) = page.global(self.global) else {
            return Ok(vec![]);
        };
        let Some(meta) = meta.as_object() else {
            return Err(ExtractError::Malformed {
                strategy: self.source,
                reason: format!("global `{}` is not an object", self.global),
            });
        };

        let mut candidates = Vec::new();
        for slot in PRODUCT_SLOTS {
            match meta.get(slot) {
                None | Some(Value::Null) => {}
                Some(Value::Array(items)) => {
                    candidates.extend(
                        items
                            .iter()
                            .filter_map(|item| RawCandidate::from_value(self.source, item)),
                    );
                }
                Some(item) => match RawCandidate::from_value(self.source, item) {
                    Some(candidate) => candidates.push(candidate),
                    None => tracing::debug!(
                        global = self.global,
                        slot,
                        "product slot holds neither an object nor a list"
                    ),
                },
            }
        }
        candidates.iter_mut().for_each(fill_from_variants);
        Ok(candidates)
    }
}

/// Fills `title` from the first variant's name and `price_min` from the
/// cheapest variant price, leaving fields the record already has alone.
fn fill_from_variants(candidate: &mut RawCandidate) {
    let Some(Value::Array(variants)) = candidate.get("variants") else {
        return;
    };

    let title = if candidate.first_str(&["title", "name"]).is_none() {
        variants.first().and_then(variant_product_title)
    } else {
        None
    };

    let price = if candidate.get("price").is_none() && candidate.get("price_min").is_none() {
        variants
            .iter()
            .filter_map(|v| v.get("price"))
            .filter_map(|p| value_as_f64(p).filter(|n| *n >= 0.0).map(|n| (n, p)))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, p)| p.clone())
    } else {
        None
    };

    candidate.insert_opt("title", title);
    candidate.insert_opt("price_min", price);
}

/// Variant names read "Product - Variant"; the suffix is dropped when it
/// matches `public_title`.
fn variant_product_title(variant: &Value) -> Option<String> {
    let name = variant.get("name").and_then(Value::as_str).map(str::trim)?;
    let stripped = variant
        .get("public_title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .and_then(|t| name.strip_suffix(t))
        .and_then(|rest| rest.trim_end().strip_suffix('-'))
        .map(str::trim_end)
        .filter(|rest| !rest.is_empty());
    let title = stripped.unwrap_or(name);
    (!title.is_empty()).then(|| title.to_owned())
}
