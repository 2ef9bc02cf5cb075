//! Product extraction from storefront pages.
//!
//! Given a [`PageSnapshot`], [`extract_products`] tries each raw extraction
//! strategy in a fixed priority order, keeps the first one whose candidates
//! map to at least one canonical [`shelfscan_core::Product`] and
//! de-duplicates those by id.
//! [`gate`] decides whether a page is worth scanning, [`feed`] hands results
//! to asynchronous subscribers, and [`PageFetcher`] turns URLs into
//! snapshots for the diagnostic tool.

pub mod candidate;
pub mod error;
pub mod extractors;
pub mod feed;
pub mod fetcher;
pub mod gate;
pub mod mapper;
pub mod page;
mod parse_helpers;
pub mod pipeline;
mod rate_limit;

pub use candidate::{CandidateSource, RawCandidate};
pub use error::{ExtractError, Rejection};
pub use extractors::{default_extractors, Extractor, EXTRACTION_ORDER};
pub use feed::{extract_and_publish, FeedSubscriber, ProductFeed, Publication, PRODUCTS_EXTRACTED_CHANNEL};
pub use fetcher::{FetchedPage, PageFetcher};
pub use gate::{
    detect_platform, is_known_platform, path_matches_product_pattern, should_extract, Platform,
    PRODUCT_PATH_PATTERNS,
};
pub use mapper::map_candidate;
pub use page::PageSnapshot;
pub use parse_helpers::{parse_price_text, slugify};
pub use pipeline::{dedupe_by_id, extract_products, extract_report, extract_with, ExtractionReport};
