//! Extraction orchestrator.
//!
//! Tries extraction strategies in priority order (analytics global,
//! alternate global, JSON-LD, DOM heuristics). Each strategy's candidates
//! are mapped to canonical products; the first strategy with at least one
//! mapped product wins and its products are de-duplicated by id. A strategy
//! whose candidates are all rejected does not stop the search.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::Serialize;
use shelfscan_core::Product;

use crate::candidate::{CandidateSource, RawCandidate};
use crate::extractors::{default_extractors, Extractor};
use crate::mapper::map_candidate;
use crate::page::PageSnapshot;

/// Outcome of one extraction pass, with enough bookkeeping to explain it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    pub url: String,
    /// The strategy whose products were used, if any mapped one.
    pub source: Option<CandidateSource>,
    /// Raw candidates returned by every strategy tried, winner included.
    pub candidates: usize,
    /// Candidates the mapper refused across those strategies.
    pub rejected: usize,
    /// Mapped products dropped because an earlier one had the same id.
    pub duplicates: usize,
    pub products: Vec<Product>,
}

/// Runs the default strategies over `page` and returns canonical products.
///
/// Never fails: faults inside a strategy are logged and that strategy is
/// treated as having found nothing.
#[must_use]
pub fn extract_products(page: &PageSnapshot) -> Vec<Product> {
    extract_report(page).products
}

/// Same as [`extract_products`] with a caller-supplied strategy list.
#[must_use]
pub fn extract_with(page: &PageSnapshot, extractors: &[Box<dyn Extractor>]) -> Vec<Product> {
    run(page, extractors).products
}

/// Runs the default strategies and reports which one won and what was
/// discarded along the way.
#[must_use]
pub fn extract_report(page: &PageSnapshot) -> ExtractionReport {
    run(page, &default_extractors())
}

fn run(page: &PageSnapshot, extractors: &[Box<dyn Extractor>]) -> ExtractionReport {
    let url = page.url().to_string();
    let mut candidates = 0;
    let mut rejected = 0;

    for extractor in extractors {
        let source = extractor.source();
        let raw = run_guarded(extractor.as_ref(), page);
        if raw.is_empty() {
            tracing::debug!(%source, "strategy found no candidates");
            continue;
        }

        candidates += raw.len();
        let mapped = map_all(source, &raw, page);
        rejected += raw.len() - mapped.len();
        if mapped.is_empty() {
            tracing::debug!(
                %source,
                count = raw.len(),
                "every candidate rejected, trying next strategy"
            );
            continue;
        }

        let mapped_count = mapped.len();
        let products = dedupe_by_id(mapped);
        let duplicates = mapped_count - products.len();

        tracing::info!(
            url = %url,
            %source,
            candidates,
            rejected,
            duplicates,
            products = products.len(),
            "extracted products"
        );

        return ExtractionReport {
            url,
            source: Some(source),
            candidates,
            rejected,
            duplicates,
            products,
        };
    }

    tracing::debug!(
        url = %url,
        candidates,
        rejected,
        "no extraction strategy yielded a product"
    );
    ExtractionReport {
        url,
        source: None,
        candidates,
        rejected,
        duplicates: 0,
        products: Vec::new(),
    }
}

fn map_all(source: CandidateSource, raw: &[RawCandidate], page: &PageSnapshot) -> Vec<Product> {
    raw.iter()
        .enumerate()
        .filter_map(|(idx, candidate)| match map_candidate(candidate, page) {
            Ok(product) => Some(product),
            Err(reason) => {
                tracing::debug!(%source, idx, %reason, "rejected raw candidate");
                None
            }
        })
        .collect()
}

/// Runs one strategy, turning both errors and panics into "no candidates".
fn run_guarded(extractor: &dyn Extractor, page: &PageSnapshot) -> Vec<RawCandidate> {
    let source = extractor.source();
    match catch_unwind(AssertUnwindSafe(|| extractor.extract(page))) {
        Ok(Ok(candidates)) => candidates,
        Ok(Err(e)) => {
            tracing::warn!(%source, error = %e, "extraction strategy failed");
            Vec::new()
        }
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::warn!(%source, panic = %message, "extraction strategy panicked");
            Vec::new()
        }
    }
}

/// Drops products whose id was already seen, keeping the first occurrence
/// and the original order.
#[must_use]
pub fn dedupe_by_id(products: Vec<Product>) -> Vec<Product> {
    let mut seen: HashSet<String> = HashSet::with_capacity(products.len());
    products
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::page::ANALYTICS_META_GLOBAL;
    use serde_json::json;
    use shelfscan_core::Availability;

    /// Returns a fixed candidate list, or fails in the configured way.
    struct Fixed {
        source: CandidateSource,
        outcome: Outcome,
    }

    enum Outcome {
        Candidates(Vec<serde_json::Value>),
        Error,
        Panic,
    }

    impl Extractor for Fixed {
        fn source(&self) -> CandidateSource {
            self.source
        }

        fn extract(&self, _page: &PageSnapshot) -> Result<Vec<RawCandidate>, ExtractError> {
            match &self.outcome {
                Outcome::Candidates(values) => Ok(values
                    .iter()
                    .filter_map(|v| RawCandidate::from_value(self.source, v))
                    .collect()),
                Outcome::Error => Err(ExtractError::Malformed {
                    strategy: self.source,
                    reason: "boom".into(),
                }),
                Outcome::Panic => panic!("extractor exploded"),
            }
        }
    }

    fn fixed(source: CandidateSource, outcome: Outcome) -> Box<dyn Extractor> {
        Box::new(Fixed { source, outcome })
    }

    fn page() -> PageSnapshot {
        PageSnapshot::from_html("https://drinkhi.com/products/hi-boy", "<html></html>").unwrap()
    }

    fn product(id: &str, title: &str) -> Product {
        Product {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            price: 1.0,
            original_price: None,
            discount_percentage: None,
            currency: "USD".into(),
            image: None,
            images: vec![],
            brand: None,
            category: "General".into(),
            tags: vec![],
            availability: Availability::InStock,
            url: "https://drinkhi.com".into(),
        }
    }

    #[test]
    fn first_strategy_with_products_wins() {
        let extractors = vec![
            fixed(CandidateSource::EmbeddedAnalytics, Outcome::Candidates(vec![])),
            fixed(
                CandidateSource::StructuredData,
                Outcome::Candidates(vec![json!({"id": "ld", "title": "LD", "price": 2})]),
            ),
            fixed(
                CandidateSource::DomHeuristic,
                Outcome::Candidates(vec![json!({"id": "dom", "title": "DOM", "price": 3})]),
            ),
        ];
        let out = extract_with(&page(), &extractors);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "ld");
    }

    #[test]
    fn fully_rejected_strategy_falls_through_to_next() {
        let extractors = vec![
            fixed(
                CandidateSource::EmbeddedAnalytics,
                Outcome::Candidates(vec![json!({"id": 9, "title": "no price"})]),
            ),
            fixed(
                CandidateSource::StructuredData,
                Outcome::Candidates(vec![json!({"id": "ld", "title": "LD", "price": 2})]),
            ),
            fixed(
                CandidateSource::DomHeuristic,
                Outcome::Candidates(vec![json!({"id": "dom", "title": "DOM", "price": 3})]),
            ),
        ];
        let report = run(&page(), &extractors);
        assert_eq!(report.source, Some(CandidateSource::StructuredData));
        assert_eq!(report.candidates, 2);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.products.len(), 1);
        assert_eq!(report.products[0].id, "ld");
    }

    #[test]
    fn partial_yield_still_wins() {
        let extractors = vec![
            fixed(
                CandidateSource::EmbeddedAnalytics,
                Outcome::Candidates(vec![
                    json!({"title": "no id", "price": 100}),
                    json!({"id": 1, "title": "Kept", "price": 100}),
                ]),
            ),
            fixed(
                CandidateSource::StructuredData,
                Outcome::Candidates(vec![json!({"id": "ld", "title": "LD", "price": 2})]),
            ),
        ];
        let out = extract_with(&page(), &extractors);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Kept");
    }

    #[test]
    fn all_strategies_rejected_reports_no_source() {
        let extractors = vec![
            fixed(
                CandidateSource::AlternateGlobal,
                Outcome::Candidates(vec![json!({"title": "no id", "price": 1})]),
            ),
            fixed(
                CandidateSource::DomHeuristic,
                Outcome::Candidates(vec![json!({"id": "d", "price": 1})]),
            ),
        ];
        let report = run(&page(), &extractors);
        assert_eq!(report.source, None);
        assert_eq!(report.candidates, 2);
        assert_eq!(report.rejected, 2);
        assert!(report.products.is_empty());
    }

    #[test]
    fn failing_and_panicking_strategies_are_skipped() {
        let extractors = vec![
            fixed(CandidateSource::EmbeddedAnalytics, Outcome::Error),
            fixed(CandidateSource::AlternateGlobal, Outcome::Panic),
            fixed(
                CandidateSource::DomHeuristic,
                Outcome::Candidates(vec![json!({"id": "d", "title": "Tile", "price": 4})]),
            ),
        ];
        let out = extract_with(&page(), &extractors);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "d");
    }

    #[test]
    fn no_strategies_means_no_products() {
        assert!(extract_with(&page(), &[]).is_empty());
    }

    #[test]
    fn dedupe_keeps_first_occurrence_in_order() {
        let out = dedupe_by_id(vec![
            product("a", "first"),
            product("b", "other"),
            product("a", "second"),
        ]);
        let titles: Vec<&str> = out.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "other"]);
    }

    #[test]
    fn report_counts_rejections_and_duplicates() {
        let page = page().with_global(
            ANALYTICS_META_GLOBAL,
            json!({"products": [
                {"id": 1, "title": "A", "price": 100},
                {"id": 1, "title": "A again", "price": 100},
                {"id": 2, "price": 100}
            ]}),
        );
        let report = extract_report(&page);
        assert_eq!(report.source, Some(CandidateSource::EmbeddedAnalytics));
        assert_eq!(report.candidates, 3);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.products.len(), 1);
        assert_eq!(report.products[0].title, "A");
    }

    #[test]
    fn report_for_empty_page_has_no_source() {
        let report = extract_report(&page());
        assert_eq!(report.source, None);
        assert!(report.products.is_empty());
    }
}
