//! HTTP page fetcher for the diagnostic tool.
//!
//! Fetching is never part of the extraction pipeline. This only turns a
//! URL into a [`PageSnapshot`] so the pipeline can be exercised against
//! live storefronts.

use std::time::Duration;

use reqwest::Client;
use shelfscan_core::AppConfig;
use url::Url;

use crate::error::ExtractError;
use crate::page::PageSnapshot;
use crate::rate_limit::RetryPolicy;

/// Seconds to wait on a 429 without a parseable `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Raw HTML plus the URL it was finally served from, after redirects.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub body: String,
}

/// Fetches storefront pages with a configured timeout, `User-Agent` and
/// retry policy.
///
/// 429 and network failures are retried with exponential backoff up to
/// `max_retries` extra attempts, waiting at least as long as a 429's
/// `Retry-After` asks. 404 and other non-2xx statuses surface as typed
/// errors without retrying.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl PageFetcher {
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            retry: RetryPolicy {
                max_retries,
                backoff_base_secs,
            },
        })
    }

    /// Builds a fetcher from the tool configuration.
    ///
    /// # Errors
    ///
    /// Same as [`PageFetcher::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ExtractError> {
        Self::new(
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_secs,
        )
    }

    /// Downloads `url`, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::InvalidUrl`]: `url` is not an absolute http(s) URL.
    /// - [`ExtractError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ExtractError::NotFound`]: HTTP 404.
    /// - [`ExtractError::UnexpectedStatus`]: any other non-2xx status.
    /// - [`ExtractError::Http`]: network failure after all retries.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, ExtractError> {
        let parsed = parse_page_url(url)?;
        let domain = parsed.host_str().unwrap_or(url).to_owned();

        self.retry.run(|| {
            let request_url = parsed.clone();
            let domain = domain.clone();
            async move {
                let response = self
                    .client
                    .get(request_url.clone())
                    .header(
                        reqwest::header::ACCEPT,
                        "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
                    )
                    .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok())
                        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                    return Err(ExtractError::RateLimited {
                        domain,
                        retry_after_secs,
                    });
                }

                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ExtractError::NotFound {
                        url: request_url.to_string(),
                    });
                }

                if !status.is_success() {
                    return Err(ExtractError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: request_url.to_string(),
                    });
                }

                let final_url = response.url().clone();
                let body = response.text().await?;
                tracing::debug!(
                    url = %final_url,
                    bytes = body.len(),
                    "fetched page"
                );
                Ok(FetchedPage {
                    url: final_url,
                    body,
                })
            }
        })
        .await
    }

    /// Downloads `url` and parses it into a [`PageSnapshot`] keyed by the
    /// final (post-redirect) URL.
    ///
    /// # Errors
    ///
    /// Same as [`PageFetcher::fetch`].
    pub async fn fetch_snapshot(&self, url: &str) -> Result<PageSnapshot, ExtractError> {
        let page = self.fetch(url).await?;
        Ok(PageSnapshot::from_parts(page.url, &page.body))
    }
}

fn parse_page_url(url: &str) -> Result<Url, ExtractError> {
    let parsed = Url::parse(url.trim()).map_err(|e| ExtractError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ExtractError::InvalidUrl {
            url: url.to_owned(),
            reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_page_url_accepts_http_and_https() {
        assert!(parse_page_url("https://drinkhi.com/products/hi-boy").is_ok());
        assert!(parse_page_url(" http://localhost:8080/ ").is_ok());
    }

    #[test]
    fn parse_page_url_rejects_relative_and_non_http() {
        assert!(matches!(
            parse_page_url("/products/hi-boy"),
            Err(ExtractError::InvalidUrl { .. })
        ));
        let err = parse_page_url("file:///tmp/page.html").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn from_config_builds_client() {
        let config = AppConfig {
            log_level: "debug".into(),
            request_timeout_secs: 5,
            user_agent: "shelfscan-test".into(),
            max_retries: 1,
            retry_backoff_base_secs: 0,
        };
        let fetcher = PageFetcher::from_config(&config).unwrap();
        assert_eq!(
            fetcher.retry,
            RetryPolicy {
                max_retries: 1,
                backoff_base_secs: 0,
            }
        );
    }
}
