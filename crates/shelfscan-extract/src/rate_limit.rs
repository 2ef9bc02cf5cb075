//! Retry policy for page fetches.
//!
//! Throttling (HTTP 429) and network failures are retried. A throttled
//! response's `Retry-After` is a lower bound on the wait. Everything else
//! is returned on first sight.

use std::future::Future;
use std::time::Duration;

use crate::error::ExtractError;

/// Upper bound on a server-requested wait.
pub(crate) const MAX_RETRY_AFTER_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    pub(crate) max_retries: u32,
    pub(crate) backoff_base_secs: u64,
}

impl RetryPolicy {
    /// Wait before retry number `retry` (0-based) after `err`, or `None`
    /// when `err` is final or the retries are spent.
    ///
    /// Exponential backoff is `backoff_base_secs * 2^retry`. For a 429 the
    /// wait is at least the server's `Retry-After`, capped at
    /// [`MAX_RETRY_AFTER_SECS`].
    pub(crate) fn delay_before_retry(&self, err: &ExtractError, retry: u32) -> Option<Duration> {
        if retry >= self.max_retries {
            return None;
        }
        let backoff = self
            .backoff_base_secs
            .saturating_mul(1u64 << retry.min(62));
        let secs = match err {
            ExtractError::RateLimited {
                retry_after_secs, ..
            } => backoff.max((*retry_after_secs).min(MAX_RETRY_AFTER_SECS)),
            ExtractError::Http(_) => backoff,
            _ => return None,
        };
        Some(Duration::from_secs(secs))
    }

    /// Runs `operation` until it succeeds, fails for good, or the retries
    /// run out. The last error is returned in the latter cases.
    pub(crate) async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, ExtractError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ExtractError>>,
    {
        let mut retry = 0u32;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            let Some(delay) = self.delay_before_retry(&err, retry) else {
                return Err(err);
            };
            retry += 1;
            tracing::warn!(
                retry,
                max_retries = self.max_retries,
                delay_secs = delay.as_secs(),
                error = %err,
                "fetch failed, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
