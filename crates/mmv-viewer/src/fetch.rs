//! Network access.
//!
//! Every fetch is a suspension point. [`HttpFetcher`] performs the blocking
//! `ureq` request on tokio's blocking pool so the caller's task yields while
//! waiting. There are no retries and, unless one is asked for, no timeout.

use std::future::Future;
use std::time::Duration;

use ureq::Agent;

use crate::error::FetchError;

/// Source of raw bytes addressed by URL.
pub trait Fetcher {
    /// Fetch `url` and return the response body.
    ///
    /// Non-success statuses are errors.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>>;
}

/// HTTP fetcher backed by a shared `ureq` agent.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    agent: Agent,
}

impl HttpFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create a fetcher with a global transport timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::build(Some(timeout))
    }

    fn build(timeout: Option<Duration>) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let agent = self.agent.clone();
        let owned = url.to_owned();
        tokio::task::spawn_blocking(move || fetch_blocking(&agent, &owned))
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_owned(),
                source: std::io::Error::other(e),
            })?
    }
}

fn fetch_blocking(agent: &Agent, url: &str) -> Result<Vec<u8>, FetchError> {
    tracing::debug!(url, "GET");

    let response = agent.get(url).call().map_err(|e| FetchError::Network {
        url: url.to_owned(),
        source: std::io::Error::other(e),
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_owned(),
            status: status.as_u16(),
        });
    }

    response
        .into_body()
        .read_to_vec()
        .map_err(|e| FetchError::Network {
            url: url.to_owned(),
            source: std::io::Error::other(e),
        })
}
