//! The HTTP transport capability.
//!
//! The session layer never talks to the network directly; it hands a URL and
//! merged [`RequestOptions`] to a [`Transport`]. Any response, whatever its
//! status, is an `Ok`; only failures with no response at all are errors.

use async_trait::async_trait;
use thiserror::Error;

use super::options::{RequestOptions, Response};

/// Performs a single HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request and returns the response, without retrying.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response could be obtained.
    async fn perform(&self, url: &str, options: &RequestOptions)
    -> Result<Response, TransportError>;
}

/// A failure that produced no HTTP response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The URL could not be parsed.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// The request timed out.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Connection, DNS, TLS or protocol failure.
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TransportError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates a network error from any underlying error.
    pub fn network(
        url: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Network {
            url: url.into(),
            source: source.into(),
        }
    }
}
