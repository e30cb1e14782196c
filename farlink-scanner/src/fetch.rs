use crate::error::Result;
use crate::link::Link;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Per-request timeout used when the caller does not pick one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// What a single fetch produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResult {
    /// The response body of a successful request.
    Ok(String),
    /// The request did not finish within the timeout.
    Timeout,
    /// Transport failure or a non-success HTTP status.
    RequestFailed(String),
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Link) -> PageResult;
}

/// `Fetcher` backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("farlink/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client })
    }

    pub fn with_default_timeout() -> Result<Self> {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Link) -> PageResult {
        debug!("Fetching {}", url);

        let response = match self.client.get(url.as_url().clone()).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return PageResult::Timeout,
            Err(e) => return PageResult::RequestFailed(e.to_string()),
        };

        // Redirects are already followed; a 3xx that is still standing is accepted as-is.
        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return PageResult::RequestFailed(format!("HTTP {}", status));
        }

        match response.text().await {
            Ok(body) => PageResult::Ok(body),
            Err(e) if e.is_timeout() => PageResult::Timeout,
            Err(e) => PageResult::RequestFailed(e.to_string()),
        }
    }
}
