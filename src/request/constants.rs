//! Constants for the request module (timeouts, redirects, backoff).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Maximum redirect hops when redirects are followed.
pub const MAX_REDIRECTS: usize = 10;

/// Base unit of the retry backoff; attempt `i` sleeps `BACKOFF_UNIT * 2^i`.
pub const BACKOFF_UNIT: Duration = Duration::from_secs(1);
