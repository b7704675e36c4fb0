//! Minimum-interval throttling for outbound requests.
//!
//! A session talks to a single origin from a single caller, so one timestamp
//! is all the state needed: [`RateLimiter::acquire`] sleeps until
//! `least_interval` has elapsed since the last recorded request, and
//! [`RateLimiter::record_request`] stamps the time a request finished.
//!
//! The timestamp starts at `now - least_interval`, so the very first request
//! never waits.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use tracing::{debug, instrument};

use crate::clock::{Clock, Sleeper};

/// Enforces a minimum wall-clock spacing between requests.
pub struct RateLimiter {
    least_interval: Duration,
    last_request: Mutex<SystemTime>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("least_interval", &self.least_interval)
            .field("last_request", &self.last_request())
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Creates a limiter whose first [`acquire`](Self::acquire) returns immediately.
    #[must_use]
    pub fn new(least_interval: Duration, clock: Arc<dyn Clock>, sleeper: Arc<dyn Sleeper>) -> Self {
        let now = clock.now();
        let last_request = now.checked_sub(least_interval).unwrap_or(now);
        Self {
            least_interval,
            last_request: Mutex::new(last_request),
            clock,
            sleeper,
        }
    }

    /// Returns the configured minimum interval.
    #[must_use]
    pub fn least_interval(&self) -> Duration {
        self.least_interval
    }

    /// Returns the time of the last recorded request.
    #[must_use]
    pub fn last_request(&self) -> SystemTime {
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns how long a request issued now would have to wait.
    #[must_use]
    pub fn pending_delay(&self) -> Duration {
        // A clock that went backwards counts as no time elapsed.
        let elapsed = self
            .clock
            .now()
            .duration_since(self.last_request())
            .unwrap_or(Duration::ZERO);
        self.least_interval.saturating_sub(elapsed)
    }

    /// Waits until the minimum interval since the last request has passed.
    #[instrument(skip(self), fields(least_interval_ms = self.least_interval.as_millis()))]
    pub async fn acquire(&self) {
        let delay = self.pending_delay();
        if delay.is_zero() {
            return;
        }
        debug!(delay_ms = delay.as_millis(), "applying rate limit delay");
        self.sleeper.sleep(delay).await;
    }

    /// Stamps the current time as the completion time of a request.
    pub fn record_request(&self) {
        let now = self.clock.now();
        *self
            .last_request
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = now;
    }
}
