use thiserror::Error;

use crate::candidate::CandidateSource;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid page URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid CSS selector \"{selector}\": {reason}")]
    Selector { selector: String, reason: String },

    #[error("malformed {strategy} payload: {reason}")]
    Malformed {
        strategy: CandidateSource,
        reason: String,
    },
}

/// Why the mapper refused to turn a candidate into a product.
///
/// Checked in declaration order; the first failing condition wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("candidate has no identifier")]
    MissingId,

    #[error("candidate has no title")]
    MissingTitle,

    #[error("candidate has no usable price")]
    MissingPrice,
}
