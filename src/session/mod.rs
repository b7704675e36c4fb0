//! Session orchestration: configuration, errors and the [`SessionClient`].

mod client;
mod config;
mod error;

pub use client::{CACHE_KEY_PREFIX, MAX_CACHE_KEY_CHARS, SessionClient, SessionClientBuilder, cache_key_for};
pub use config::{
    ClientConfig, ConfigError, DEFAULT_CACHE_TTL_CAP_SECONDS, DEFAULT_LEAST_INTERVAL_MILLIS,
    DEFAULT_MAX_RETRY_COUNT, MAX_CACHE_TTL_CAP_SECONDS,
};
pub use error::SessionError;
