//! Transport-neutral request options and response shapes.
//!
//! [`RequestOptions`] is what callers, the client configuration and the login
//! flow each contribute to an outgoing request; [`RequestOptions::merged_over`]
//! layers them. [`Response`] keeps every header value separately so that
//! multi-valued `Set-Cookie` headers survive.

use std::collections::BTreeMap;
use std::fmt;

use reqwest::Method;
use serde::Deserialize;

/// Header names whose values are never written to logs.
const REDACTED_HEADERS: &[&str] = &["cookie", "authorization", "proxy-authorization"];

/// A single form field value.
///
/// Scraped form fields are always [`FormValue::Text`]; credentials supplied by
/// callers may also be numbers or booleans.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    /// Plain text value.
    Text(String),
    /// Numeric value, rendered with `serde_json` number formatting.
    Number(serde_json::Number),
    /// Boolean value, rendered as `true`/`false`.
    Bool(bool),
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) => write!(f, "{number}"),
            Self::Bool(flag) => write!(f, "{flag}"),
        }
    }
}

// Form values routinely hold passwords.
impl fmt::Debug for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FormValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for FormValue {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Fields sent as `application/x-www-form-urlencoded`.
    Form(BTreeMap<String, FormValue>),
    /// Raw body sent as-is.
    Raw(String),
}

impl Payload {
    /// Encodes the payload into a request body.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Form(fields) => fields
                .iter()
                .map(|(name, value)| {
                    format!(
                        "{}={}",
                        urlencoding::encode(name),
                        urlencoding::encode(&value.to_string())
                    )
                })
                .collect::<Vec<_>>()
                .join("&"),
            Self::Raw(body) => body.clone(),
        }
    }

    /// Returns the content type implied by the payload kind, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Form(_) => Some("application/x-www-form-urlencoded"),
            Self::Raw(_) => None,
        }
    }
}

/// Options for a single outgoing request.
///
/// Every field is optional so that several layers can be merged; unset fields
/// fall back to the transport's defaults (`GET`, follow redirects).
#[derive(Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestOptions {
    /// HTTP method.
    #[serde(with = "method_serde")]
    pub method: Option<Method>,
    /// Request headers keyed by lower-cased name.
    pub headers: BTreeMap<String, String>,
    /// Request body.
    pub payload: Option<Payload>,
    /// Whether the transport follows redirects.
    pub follow_redirects: Option<bool>,
    /// Per-request timeout override in seconds.
    pub timeout_secs: Option<u64>,
}

impl RequestOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Adds a header; the name is stored lower-cased.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Sets redirect handling.
    #[must_use]
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = Some(follow);
        self
    }

    /// Returns the effective method (`GET` when unset).
    #[must_use]
    pub fn effective_method(&self) -> Method {
        self.method.clone().unwrap_or(Method::GET)
    }

    /// Returns the value of a header, matched case-insensitively.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Layers `self` over `base`: every field set in `self` wins, headers merge by name.
    #[must_use]
    pub fn merged_over(&self, base: &RequestOptions) -> RequestOptions {
        let mut headers: BTreeMap<String, String> = base
            .headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect();
        for (name, value) in &self.headers {
            headers.insert(name.to_ascii_lowercase(), value.clone());
        }

        RequestOptions {
            method: self.method.clone().or_else(|| base.method.clone()),
            headers,
            payload: self.payload.clone().or_else(|| base.payload.clone()),
            follow_redirects: self.follow_redirects.or(base.follow_redirects),
            timeout_secs: self.timeout_secs.or(base.timeout_secs),
        }
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: BTreeMap<&str, &str> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let shown = if REDACTED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                    "[REDACTED]"
                } else {
                    value.as_str()
                };
                (name.as_str(), shown)
            })
            .collect();
        f.debug_struct("RequestOptions")
            .field("method", &self.method)
            .field("headers", &headers)
            .field("payload", &self.payload)
            .field("follow_redirects", &self.follow_redirects)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

mod method_serde {
    use reqwest::Method;
    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Option<Method>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|name| {
            Method::from_bytes(name.to_ascii_uppercase().as_bytes())
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}

/// A response as seen by the session layer.
#[derive(Clone, PartialEq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Headers in arrival order, one entry per value, names lower-cased.
    pub headers: Vec<(String, String)>,
    /// Response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a response; header names are lower-cased.
    #[must_use]
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the first value of `name`, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns every `Set-Cookie` value in arrival order.
    #[must_use]
    pub fn set_cookies(&self) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case("set-cookie"))
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Whether the status is below 400 (3xx counts as success).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status < 400
    }

    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                let shown = if name == "set-cookie" {
                    "[REDACTED]"
                } else {
                    value.as_str()
                };
                (name.as_str(), shown)
            })
            .collect();
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &headers)
            .field("body_len", &self.body.len())
            .finish()
    }
}
