//! Session Client Library
//!
//! A session-aware HTTP client: it logs in through a site's HTML login form,
//! persists the resulting cookies across invocations, throttles outbound
//! requests and retries failures with exponential backoff.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`auth`] - Cookie jar, login form extraction and action URL resolution
//! - [`request`] - Request options, HTTP transport, rate limiting and retry
//! - [`cache`] - Key-value persistence for session state
//! - [`clock`] - Time and sleep capabilities
//! - [`session`] - The [`SessionClient`] orchestrator and its configuration
//!
//! # Example
//!
//! ```no_run
//! use session_client::{RequestOptions, SessionClient};
//!
//! # async fn example() -> Result<(), session_client::SessionError> {
//! let mut client = SessionClient::builder("https://example.com/login")
//!     .credential("user", "alice")
//!     .credential("password", "hunter2")
//!     .build()?;
//!
//! let response = client
//!     .fetch("https://example.com/account", RequestOptions::new())
//!     .await?;
//! println!("{}", response.text());
//! # Ok(())
//! # }
//! ```

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod cache;
pub mod clock;
pub mod request;
pub mod session;
mod user_agent;

// Re-export commonly used types
pub use auth::{Cookie, CookieError, CookieJar, LoginForm, LoginFormExtractor, resolve_action_url};
pub use cache::{CacheError, FileCache, InMemoryCache, KeyValueCache, default_cache_dir};
#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
pub use clock::{Clock, Sleeper, SystemClock, TokioSleeper};
pub use request::{
    FormValue, Payload, RateLimiter, ReqwestTransport, RequestOptions, Response, RetryExecutor,
    Transport, TransportError,
};
pub use session::{ClientConfig, ConfigError, SessionClient, SessionClientBuilder, SessionError};
