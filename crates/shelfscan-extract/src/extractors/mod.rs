//! Raw extraction strategies.
//!
//! Each strategy inspects one data source on a [`PageSnapshot`] and returns
//! source-shaped [`RawCandidate`]s. None of them know about the canonical
//! product model; see [`crate::mapper`] for that.
//!
//! Strategies are tried in [`EXTRACTION_ORDER`] by [`crate::pipeline`]: the
//! two analytics globals first, then JSON-LD, then DOM scraping as the last
//! resort.

mod dom;
mod globals;
mod jsonld;

pub use dom::{DomExtractor, MAX_DOM_PRODUCTS, PRODUCT_ELEMENT_SELECTOR};
pub use globals::GlobalSlotExtractor;
pub use jsonld::{JsonLdExtractor, SCHEMA_IN_STOCK};

use scraper::Selector;

use crate::candidate::{CandidateSource, RawCandidate};
use crate::error::ExtractError;
use crate::page::PageSnapshot;

/// Fixed priority order. The analytics global beats the alternate global
/// purely by position; there is no other tie-break.
pub const EXTRACTION_ORDER: [CandidateSource; 4] = [
    CandidateSource::EmbeddedAnalytics,
    CandidateSource::AlternateGlobal,
    CandidateSource::StructuredData,
    CandidateSource::DomHeuristic,
];

/// One extraction strategy: scan a snapshot, return raw candidates.
///
/// A missing data source is not an error; return `Ok(vec![])`. Reserve
/// `Err` for faults the orchestrator should log.
pub trait Extractor {
    fn source(&self) -> CandidateSource;

    /// # Errors
    ///
    /// Returns an [`ExtractError`] when the source exists but cannot be
    /// scanned at all.
    fn extract(&self, page: &PageSnapshot) -> Result<Vec<RawCandidate>, ExtractError>;
}

/// Builds the extractor for one source kind.
#[must_use]
pub fn extractor_for(source: CandidateSource) -> Box<dyn Extractor> {
    match source {
        CandidateSource::EmbeddedAnalytics => Box::new(GlobalSlotExtractor::embedded_analytics()),
        CandidateSource::AlternateGlobal => Box::new(GlobalSlotExtractor::alternate_global()),
        CandidateSource::StructuredData => Box::new(JsonLdExtractor),
        CandidateSource::DomHeuristic => Box::new(DomExtractor::default()),
    }
}

/// All four strategies in [`EXTRACTION_ORDER`].
#[must_use]
pub fn default_extractors() -> Vec<Box<dyn Extractor>> {
    EXTRACTION_ORDER.into_iter().map(extractor_for).collect()
}

pub(crate) fn parse_selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector {
        selector: css.to_owned(),
        reason: format!("{e:?}"),
    })
}
