//! Request plumbing: options, transport, throttling and retry.
//!
//! # Example
//!
//! ```no_run
//! use session_client::request::{ReqwestTransport, RequestOptions, Transport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = ReqwestTransport::new()?;
//! let response = transport
//!     .perform("https://example.com/", &RequestOptions::new())
//!     .await?;
//! println!("status {}", response.status);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod options;
pub mod rate_limiter;
mod retry;
mod transport;

pub use client::ReqwestTransport;
pub use options::{FormValue, Payload, RequestOptions, Response};
pub use rate_limiter::RateLimiter;
pub use retry::{AttemptFailure, RetryExecutor, RetryExhausted};
pub use transport::{Transport, TransportError};
