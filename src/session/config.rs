//! Session client configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::auth::{DEFAULT_FORM_SELECTOR, LoginFormExtractor, SelectorError};
use crate::request::RequestOptions;

/// Default number of attempts per request.
pub const DEFAULT_MAX_RETRY_COUNT: u32 = 5;
/// Default minimum spacing between requests, in milliseconds.
pub const DEFAULT_LEAST_INTERVAL_MILLIS: u64 = 5000;
/// Default upper bound for the persisted session TTL (6 hours).
pub const DEFAULT_CACHE_TTL_CAP_SECONDS: u64 = 21_600;
/// Largest accepted `cacheTtlCapSeconds` (one year).
pub const MAX_CACHE_TTL_CAP_SECONDS: u64 = 31_536_000;

/// Recognised options for a [`SessionClient`](super::SessionClient).
///
/// Deserializes from camelCase JSON; every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ClientConfig {
    /// Attempts per request, including the first.
    pub max_retry_count: u32,
    /// Minimum spacing between requests in milliseconds.
    pub least_interval_millis: u64,
    /// Selector for the login form element.
    pub login_form_selector: String,
    /// Selector for scraped inputs; `None` means inputs inside the login form.
    pub login_form_input_selector: Option<String>,
    /// Options merged under every outgoing request.
    pub request_option_overrides: RequestOptions,
    /// Emit an info event for each request and response.
    pub logging_enabled: bool,
    /// Upper bound for the persisted session TTL in seconds.
    pub cache_ttl_cap_seconds: u64,
    /// Keep matching and persisting cookies after they expire.
    pub reuses_expired_cookies: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_retry_count: DEFAULT_MAX_RETRY_COUNT,
            least_interval_millis: DEFAULT_LEAST_INTERVAL_MILLIS,
            login_form_selector: DEFAULT_FORM_SELECTOR.to_string(),
            login_form_input_selector: None,
            request_option_overrides: RequestOptions::default(),
            logging_enabled: false,
            cache_ttl_cap_seconds: DEFAULT_CACHE_TTL_CAP_SECONDS,
            reuses_expired_cookies: false,
        }
    }
}

/// Errors from loading or validating a [`ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A numeric option is out of range.
    #[error("invalid config value for `{field}`: {value}. Expected range: {expected}")]
    OutOfRange {
        /// camelCase option name.
        field: &'static str,
        /// Rejected value.
        value: u64,
        /// Human-readable accepted range.
        expected: &'static str,
    },

    /// A selector option is not valid CSS.
    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config document is not valid JSON of the expected shape.
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientConfig {
    /// Checks ranges and selector syntax.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for the first invalid option found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retry_count == 0 {
            return Err(ConfigError::OutOfRange {
                field: "maxRetryCount",
                value: 0,
                expected: "1..",
            });
        }
        if !(1..=MAX_CACHE_TTL_CAP_SECONDS).contains(&self.cache_ttl_cap_seconds) {
            return Err(ConfigError::OutOfRange {
                field: "cacheTtlCapSeconds",
                value: self.cache_ttl_cap_seconds,
                expected: "1..=31536000",
            });
        }
        self.form_extractor()?;
        Ok(())
    }

    /// Builds the login form extractor described by the selector options.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] if a selector is not valid CSS.
    pub fn form_extractor(&self) -> Result<LoginFormExtractor, SelectorError> {
        LoginFormExtractor::new(
            &self.login_form_selector,
            self.login_form_input_selector.as_deref(),
        )
    }

    /// Parses and validates a JSON config document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for malformed JSON or invalid values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or is invalid.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}
