//! Cookie jar with `Set-Cookie` parsing, RFC 6265 scoping and expiry tracking.
//!
//! The jar is owned by a single session. It is filled from `Set-Cookie`
//! response headers via [`CookieJar::set_from_header`], queried with
//! [`CookieJar::cookies_for`] / [`CookieJar::cookie_header`], and persisted
//! through [`CookieJar::serialize`] / [`CookieJar::deserialize`].
//!
//! Times are whole unix seconds. A cookie's effective expiry is the earlier of
//! its `Expires` timestamp and `received_at + Max-Age`.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::clock::unix_seconds;

/// Version tag written into every persisted jar.
pub const JAR_FORMAT_VERSION: u32 = 1;

/// A single cookie.
///
/// The value is redacted in Debug output to prevent accidental logging of
/// session tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value (sensitive, never log).
    value: String,
    /// Lower-cased domain without a leading dot.
    pub domain: String,
    /// Path scope.
    pub path: String,
    /// Only sent over `https`.
    pub secure: bool,
    /// Marked `HttpOnly` by the server.
    #[serde(default)]
    pub http_only: bool,
    /// Only sent to exactly `domain` (no `Domain` attribute was given).
    pub host_only: bool,
    /// Absolute expiry in unix seconds, from the `Expires` attribute.
    pub expires: Option<i64>,
    /// Lifetime in seconds counted from `received_at`, from `Max-Age`.
    pub max_age: Option<i64>,
    /// When the cookie was received, in unix seconds.
    pub received_at: i64,
}

impl Cookie {
    /// Creates a host-only session cookie scoped to `domain` and `path`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
        path: impl Into<String>,
        received_at: i64,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into().trim_start_matches('.').to_ascii_lowercase(),
            path: path.into(),
            secure: false,
            http_only: false,
            host_only: true,
            expires: None,
            max_age: None,
            received_at,
        }
    }

    /// Returns the cookie value.
    ///
    /// Cookie values are sensitive; avoid logging the return value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Parses one `Set-Cookie` header value received from `url` at `now`.
    ///
    /// Unknown attributes and unparseable `Expires`/`Max-Age` values are
    /// ignored, as RFC 6265 requires.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError`] when the name-value pair is missing or empty,
    /// or when the `Domain` attribute does not cover the request host.
    pub fn parse(raw: &str, url: &Url, now: SystemTime) -> Result<Self, CookieError> {
        let mut parts = raw.split(';');
        let pair = parts.next().unwrap_or_default();
        let Some((name, value)) = pair.split_once('=') else {
            return Err(CookieError::MissingNameValue);
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(CookieError::EmptyName);
        }

        let host = request_host(url);
        let mut cookie = Cookie::new(name, value.trim(), host.clone(), default_path(url), unix_seconds(now));

        for attribute in parts {
            let (key, attr_value) = match attribute.split_once('=') {
                Some((key, attr_value)) => (key.trim(), attr_value.trim()),
                None => (attribute.trim(), ""),
            };

            match key.to_ascii_lowercase().as_str() {
                "expires" => match parse_cookie_date(attr_value) {
                    Some(time) => cookie.expires = Some(unix_seconds(time)),
                    None => debug!(name = %cookie.name, "ignoring unparseable Expires attribute"),
                },
                "max-age" => match attr_value.parse::<i64>() {
                    Ok(seconds) => cookie.max_age = Some(seconds),
                    Err(_) => debug!(name = %cookie.name, "ignoring unparseable Max-Age attribute"),
                },
                "domain" => {
                    let domain = attr_value.trim_start_matches('.').to_ascii_lowercase();
                    if domain.is_empty() {
                        continue;
                    }
                    if !domain_matches(&host, &domain) {
                        return Err(CookieError::DomainMismatch { domain, host });
                    }
                    cookie.domain = domain;
                    cookie.host_only = false;
                }
                "path" => {
                    if attr_value.starts_with('/') {
                        cookie.path = attr_value.to_string();
                    }
                }
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                _ => {}
            }
        }

        Ok(cookie)
    }

    /// Returns the effective expiry in unix seconds, if the cookie has one.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        let from_max_age = self
            .max_age
            .map(|seconds| self.received_at.saturating_add(seconds));
        match (self.expires, from_max_age) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Returns the remaining lifetime in seconds at `now` (negative once expired).
    #[must_use]
    pub fn remaining_secs(&self, now: SystemTime) -> Option<i64> {
        self.expires_at()
            .map(|expires_at| expires_at.saturating_sub(unix_seconds(now)))
    }

    /// Whether the cookie has expired at `now`. Session cookies never expire.
    #[must_use]
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.remaining_secs(now).is_some_and(|remaining| remaining <= 0)
    }

    /// Whether this cookie should be sent to `url` (domain, path and secure rules).
    #[must_use]
    pub fn matches(&self, url: &Url) -> bool {
        let host = request_host(url);
        let domain_ok = if self.host_only {
            host == self.domain
        } else {
            domain_matches(&host, &self.domain)
        };
        domain_ok && path_matches(url.path(), &self.path) && (!self.secure || url.scheme() == "https")
    }

    fn same_key(&self, other: &Cookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }
}

// Custom Debug impl that redacts the cookie value.
impl fmt::Debug for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookie")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("secure", &self.secure)
            .field("http_only", &self.http_only)
            .field("host_only", &self.host_only)
            .field("expires", &self.expires)
            .field("max_age", &self.max_age)
            .field("received_at", &self.received_at)
            .finish()
    }
}

/// Errors from cookie parsing and jar persistence.
#[derive(Debug, thiserror::Error)]
pub enum CookieError {
    /// The header has no `name=value` pair.
    #[error("Set-Cookie value has no name=value pair")]
    MissingNameValue,

    /// The cookie name is empty.
    #[error("Set-Cookie value has an empty cookie name")]
    EmptyName,

    /// The `Domain` attribute does not cover the request host.
    #[error("cookie domain '{domain}' does not match request host '{host}'")]
    DomainMismatch {
        /// The rejected domain attribute.
        domain: String,
        /// The host the response came from.
        host: String,
    },

    /// The persisted jar has a version this build cannot read.
    #[error("unsupported cookie jar format version {0}")]
    UnsupportedVersion(u32),

    /// The persisted jar is not valid JSON of the expected shape.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize)]
struct StoredJar {
    version: u32,
    cookies: Vec<Cookie>,
}

/// An ordered set of cookies, unique by `(domain, path, name)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
    reuse_expired: bool,
}

impl CookieJar {
    /// Creates an empty jar that ignores expired cookies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty jar; with `reuse_expired`, expired cookies are still
    /// matched and persisted.
    #[must_use]
    pub fn with_expired_reuse(reuse_expired: bool) -> Self {
        Self {
            cookies: Vec::new(),
            reuse_expired,
        }
    }

    /// Whether expired cookies are retained.
    #[must_use]
    pub fn reuses_expired(&self) -> bool {
        self.reuse_expired
    }

    /// Number of cookies held, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Whether the jar holds no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Iterates over all cookies in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter()
    }

    /// Inserts `cookie`, replacing any cookie with the same domain, path and name in place.
    pub fn insert(&mut self, cookie: Cookie) {
        if let Some(existing) = self.cookies.iter_mut().find(|c| c.same_key(&cookie)) {
            *existing = cookie;
        } else {
            self.cookies.push(cookie);
        }
    }

    /// Parses a `Set-Cookie` value received from `url` and upserts it.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError`] when the header cannot be turned into a cookie;
    /// the jar is left unchanged.
    #[instrument(level = "debug", skip(self, raw, now), fields(url = %url))]
    pub fn set_from_header(&mut self, raw: &str, url: &Url, now: SystemTime) -> Result<(), CookieError> {
        let cookie = Cookie::parse(raw, url, now)?;
        debug!(
            name = %cookie.name,
            domain = %cookie.domain,
            path = %cookie.path,
            "storing cookie"
        );
        self.insert(cookie);
        Ok(())
    }

    /// Returns cookies to send to `url`, longest path first.
    ///
    /// Expired cookies are excluded unless the jar reuses expired cookies.
    #[must_use]
    pub fn cookies_for(&self, url: &Url, now: SystemTime) -> Vec<&Cookie> {
        let mut matching: Vec<&Cookie> = self
            .cookies
            .iter()
            .filter(|cookie| cookie.matches(url))
            .filter(|cookie| self.reuse_expired || !cookie.is_expired(now))
            .collect();
        // Stable sort keeps arrival order among equal path lengths.
        matching.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        matching
    }

    /// Builds the `Cookie` request header for `url`, or `None` when nothing matches.
    #[must_use]
    pub fn cookie_header(&self, url: &Url, now: SystemTime) -> Option<String> {
        let cookies = self.cookies_for(url, now);
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|cookie| format!("{}={}", cookie.name, cookie.value()))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Returns the persistence TTL for state covering `url`, in seconds.
    ///
    /// Takes the shortest remaining lifetime among matching unexpired cookies,
    /// clamped to `1..=cap_secs`. When no matching cookie carries a lifetime,
    /// `cap_secs` is returned.
    #[must_use]
    pub fn minimum_remaining_ttl(&self, url: &Url, now: SystemTime, cap_secs: u64) -> u64 {
        let cap_secs = cap_secs.max(1);
        self.cookies_for(url, now)
            .into_iter()
            .filter(|cookie| !cookie.is_expired(now))
            .filter_map(|cookie| cookie.remaining_secs(now))
            .min()
            .map_or(cap_secs, |remaining| {
                u64::try_from(remaining).unwrap_or(1).clamp(1, cap_secs)
            })
    }

    /// Drops expired cookies and returns how many were removed.
    pub fn remove_expired(&mut self, now: SystemTime) -> usize {
        let before = self.cookies.len();
        self.cookies.retain(|cookie| !cookie.is_expired(now));
        before - self.cookies.len()
    }

    /// Serializes the jar into its persisted form.
    ///
    /// Expired cookies are left out unless the jar reuses expired cookies.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError::Json`] if serialization fails.
    pub fn serialize(&self, now: SystemTime) -> Result<Vec<u8>, CookieError> {
        let cookies = self
            .cookies
            .iter()
            .filter(|cookie| self.reuse_expired || !cookie.is_expired(now))
            .cloned()
            .collect();
        let stored = StoredJar {
            version: JAR_FORMAT_VERSION,
            cookies,
        };
        Ok(serde_json::to_vec(&stored)?)
    }

    /// Restores a jar from its persisted form.
    ///
    /// # Errors
    ///
    /// Returns [`CookieError::Json`] for malformed input and
    /// [`CookieError::UnsupportedVersion`] for an unknown version tag.
    pub fn deserialize(bytes: &[u8], reuse_expired: bool) -> Result<Self, CookieError> {
        let stored: StoredJar = serde_json::from_slice(bytes)?;
        if stored.version != JAR_FORMAT_VERSION {
            warn!(version = stored.version, "refusing persisted cookie jar with unknown version");
            return Err(CookieError::UnsupportedVersion(stored.version));
        }
        let mut jar = Self::with_expired_reuse(reuse_expired);
        for cookie in stored.cookies {
            jar.insert(cookie);
        }
        Ok(jar)
    }
}

fn request_host(url: &Url) -> String {
    url.host_str().unwrap_or_default().to_ascii_lowercase()
}

/// RFC 6265 §5.1.3 domain-match.
fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}

/// RFC 6265 §5.1.4 path-match.
fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/')
            || request_path.as_bytes().get(cookie_path.len()) == Some(&b'/'))
}

/// RFC 6265 §5.1.4 default-path of a request URL.
fn default_path(url: &Url) -> String {
    let path = url.path();
    if !path.starts_with('/') {
        return "/".to_string();
    }
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(index) => path[..index].to_string(),
    }
}

/// Parses an `Expires` value, accepting the dashed `Wed, 21-Oct-2025 07:28:00 GMT` form.
fn parse_cookie_date(value: &str) -> Option<SystemTime> {
    httpdate::parse_http_date(value)
        .ok()
        .or_else(|| httpdate::parse_http_date(&value.replace('-', " ")).ok())
}
