//! Bounded retry with exponential backoff.
//!
//! [`RetryExecutor::execute`] runs up to `max_attempts` attempts. Each failed
//! attempt is classified as an [`AttemptFailure`]:
//! - [`AttemptFailure::HttpStatus`] - a response arrived with status >= 400.
//!   The executor sleeps `1s * 2^attempt` before the next attempt.
//! - [`AttemptFailure::Transport`] - no response at all. It is logged and the
//!   next attempt starts without a backoff sleep.
//!
//! Backoff depends only on the attempt index; server hints such as
//! `Retry-After` are ignored. No sleep follows the final attempt.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::constants::BACKOFF_UNIT;
use super::options::Response;
use super::transport::TransportError;
use crate::clock::Sleeper;

/// Why a single attempt failed.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    /// The server answered with an error status.
    #[error("HTTP {status}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
        /// The full error response.
        response: Box<Response>,
    },

    /// No response was obtained.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl AttemptFailure {
    /// Wraps an error response.
    #[must_use]
    pub fn http_status(response: Response) -> Self {
        Self::HttpStatus {
            status: response.status,
            response: Box::new(response),
        }
    }

    /// Returns the HTTP status when the failure carried a response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }
}

/// Terminal error after every attempt failed.
#[derive(Debug, Error)]
#[error("request to {url} failed after {attempts} attempt(s): {last_failure}")]
pub struct RetryExhausted {
    /// The URL that was requested.
    pub url: String,
    /// How many attempts were made.
    pub attempts: u32,
    /// The failure observed on the final attempt.
    #[source]
    pub last_failure: AttemptFailure,
}

/// Runs request attempts with bounded retry and exponential backoff.
pub struct RetryExecutor {
    max_attempts: u32,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl RetryExecutor {
    /// Creates an executor; `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            sleeper,
        }
    }

    /// Returns the maximum number of attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the backoff slept after a status failure on `attempt` (1-indexed).
    #[must_use]
    pub fn backoff_delay(attempt: u32) -> Duration {
        BACKOFF_UNIT.saturating_mul(2_u32.saturating_pow(attempt))
    }

    /// Invokes `attempt_fn` until it yields a successful response or attempts run out.
    ///
    /// `attempt_fn` receives the 1-indexed attempt number.
    ///
    /// # Errors
    ///
    /// Returns [`RetryExhausted`] carrying the last failure when no attempt succeeded.
    #[instrument(skip(self, attempt_fn), fields(max_attempts = self.max_attempts))]
    pub async fn execute<F, Fut>(&self, url: &str, mut attempt_fn: F) -> Result<Response, RetryExhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Response, TransportError>>,
    {
        let mut attempt = 1;
        loop {
            let failure = match attempt_fn(attempt).await {
                Ok(response) if response.is_success() => {
                    debug!(attempt, status = response.status, "attempt succeeded");
                    return Ok(response);
                }
                Ok(response) => AttemptFailure::http_status(response),
                Err(error) => AttemptFailure::Transport(error),
            };

            warn!(
                url,
                attempt,
                max_attempts = self.max_attempts,
                error = %failure,
                "request attempt failed"
            );

            if attempt >= self.max_attempts {
                return Err(RetryExhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last_failure: failure,
                });
            }

            if let AttemptFailure::HttpStatus { .. } = failure {
                let delay = Self::backoff_delay(attempt);
                debug!(attempt, delay_ms = delay.as_millis(), "backing off before retry");
                self.sleeper.sleep(delay).await;
            }

            attempt += 1;
        }
    }
}
