//! Error types for session operations.

use thiserror::Error;

use super::config::ConfigError;
use crate::cache::CacheError;
use crate::request::{AttemptFailure, RetryExhausted, TransportError};

/// Errors returned by [`SessionClient`](super::SessionClient).
#[derive(Debug, Error)]
pub enum SessionError {
    /// A URL could not be parsed.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL that was rejected.
        url: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The login POST completed without setting any cookie.
    #[error("login at {url} returned HTTP {status} without setting a cookie")]
    LoginFailed {
        /// The URL credentials were posted to.
        url: String,
        /// Status of the login response.
        status: u16,
    },

    /// Every attempt of a request failed.
    #[error("request to {url} failed after {attempts} attempt(s): {detail}")]
    RetryExhausted {
        /// The URL that was requested.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// HTTP status of the last attempt, if a response arrived.
        last_status: Option<u16>,
        /// Description of the last failure.
        detail: String,
        /// The exhausted retry sequence.
        #[source]
        source: RetryExhausted,
    },

    /// The session cache could not be read or written.
    #[error("session cache error: {0}")]
    Cache(#[from] CacheError),

    /// The cookie jar could not be serialized.
    #[error("failed to serialize cookie jar: {0}")]
    Serialization(String),

    /// The client configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The default HTTP transport could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl SessionError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a login failure error.
    pub fn login_failed(url: impl Into<String>, status: u16) -> Self {
        Self::LoginFailed {
            url: url.into(),
            status,
        }
    }

    /// Returns the HTTP status of the last failed attempt, if known.
    #[must_use]
    pub fn last_status(&self) -> Option<u16> {
        match self {
            Self::RetryExhausted { last_status, .. } => *last_status,
            Self::LoginFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<RetryExhausted> for SessionError {
    fn from(error: RetryExhausted) -> Self {
        let detail = match &error.last_failure {
            AttemptFailure::HttpStatus { status, .. } => format!("HTTP {status}"),
            AttemptFailure::Transport(TransportError::Timeout { .. }) => {
                "request timed out".to_string()
            }
            AttemptFailure::Transport(e) => e.to_string(),
        };
        Self::RetryExhausted {
            url: error.url.clone(),
            attempts: error.attempts,
            last_status: error.last_failure.status(),
            detail,
            source: error,
        }
    }
}
