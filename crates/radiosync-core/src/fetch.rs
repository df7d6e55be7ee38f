//! Remote catalog fetching.
//!
//! [`RemoteFetcher`] is the seam between the sync logic and the network.
//! [`HttpFetcher`] performs a single blocking GET with a bounded timeout.

use std::time::Duration;

use tracing::{debug, info};

use crate::error::SyncError;

/// Default timeout for the remote catalog request.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Source of the raw remote catalog body.
#[cfg_attr(test, mockall::automock)]
pub trait RemoteFetcher: Send + Sync {
    /// Fetch the raw catalog body, undecoded.
    ///
    /// Connection failures, timeouts and non-success statuses are reported as
    /// [`SyncError::Fetch`].
    fn fetch(&self) -> std::result::Result<Vec<u8>, SyncError>;
}

/// Blocking HTTP(S) fetcher for a fixed URL.
///
/// A client is built per request so the fetcher can be created and dropped
/// from async contexts; the request itself must run on a blocking thread.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    url: String,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher for `url` with the default timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The remote URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn describe(&self, e: &reqwest::Error) -> String {
        if e.is_timeout() {
            format!("timed out after {}s", self.timeout.as_secs_f32())
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else {
            e.to_string()
        }
    }
}

impl RemoteFetcher for HttpFetcher {
    fn fetch(&self) -> std::result::Result<Vec<u8>, SyncError> {
        debug!("Fetching remote catalog from {}", self.url);

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .build()
            .map_err(|e| {
                SyncError::fetch(&self.url, format!("Failed to create HTTP client: {e}"))
            })?;

        let response = client
            .get(&self.url)
            .send()
            .map_err(|e| SyncError::fetch(&self.url, self.describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::fetch(&self.url, format!("HTTP status {status}")));
        }

        // Decoded strictly by the caller
        let body = response
            .bytes()
            .map_err(|e| SyncError::fetch(&self.url, self.describe(&e)))?;

        info!("Fetched remote catalog ({} bytes)", body.len());
        Ok(body.to_vec())
    }
}
