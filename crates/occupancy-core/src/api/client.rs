//! HTTP access to the occupancy listing.
//!
//! `DocumentFetcher` is the capability the refresh cycle depends on;
//! `HttpFetcher` is the reqwest-backed implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::{debug, warn};

use super::FetchError;

/// User agent sent with every request
const USER_AGENT: &str = concat!("occupancy/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Fetches a document body as text.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

#[async_trait]
impl<T: DocumentFetcher + ?Sized> DocumentFetcher for std::sync::Arc<T> {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        (**self).fetch(url).await
    }
}

/// reqwest-backed fetcher.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    /// Create a fetcher whose requests each give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }

    /// `Ok(None)` on 429 so the caller can back off and retry.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, FetchError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(FetchError::from_status(status, &body))
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else {
            FetchError::Connection(e)
        }
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = self
                .client
                .get(url)
                .header(header::ACCEPT, "text/html,*/*")
                .send()
                .await
                .map_err(|e| self.map_send_error(e))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let body = response.text().await.map_err(|e| self.map_send_error(e))?;
                    debug!(url = url, bytes = body.len(), "Fetched document");
                    return Ok(body);
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(FetchError::RateLimited);
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("occupancy/"));
        assert!(USER_AGENT.len() > "occupancy/".len());
    }

    #[test]
    fn test_new_records_timeout() {
        let fetcher = HttpFetcher::new(Duration::from_secs(7)).unwrap();
        assert_eq!(fetcher.timeout_secs, 7);
    }
}
