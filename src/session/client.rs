//! The session orchestrator.
//!
//! [`SessionClient::fetch`] ties the pieces together:
//!
//! 1. When no cookie matches the target URL, log in: fetch the login page,
//!    extract its form, resolve the action URL and POST the scraped fields
//!    merged with the configured credentials (redirects not followed).
//! 2. Layer the caller's options over `requestOptionOverrides` and attach a
//!    `Cookie` header built from the jar.
//! 3. Run throttled attempts under the retry executor.
//! 4. Fold `Set-Cookie` values into the jar and persist it with a TTL bounded
//!    by the shortest-lived matching cookie.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use reqwest::Method;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::config::{ClientConfig, ConfigError};
use super::error::SessionError;
use crate::auth::{CookieJar, resolve_action_url};
use crate::cache::{InMemoryCache, KeyValueCache};
use crate::clock::{Clock, Sleeper, SystemClock, TokioSleeper};
use crate::request::{
    FormValue, Payload, RateLimiter, ReqwestTransport, RequestOptions, Response, RetryExecutor,
    Transport,
};

/// Prefix of every session cache key.
pub const CACHE_KEY_PREFIX: &str = "SessionClient.";

/// Maximum cache key length in characters.
pub const MAX_CACHE_KEY_CHARS: usize = 250;

/// Builds the cache key for a login URL, truncated to [`MAX_CACHE_KEY_CHARS`].
#[must_use]
pub fn cache_key_for(login_url: &str) -> String {
    format!("{CACHE_KEY_PREFIX}{login_url}")
        .chars()
        .take(MAX_CACHE_KEY_CHARS)
        .collect()
}

/// An HTTP client bound to one login identity on one site.
pub struct SessionClient {
    login_url: String,
    credentials: BTreeMap<String, FormValue>,
    config: ClientConfig,
    jar: CookieJar,
    cache_key: String,
    transport: Arc<dyn Transport>,
    cache: Arc<dyn KeyValueCache>,
    clock: Arc<dyn Clock>,
    rate_limiter: RateLimiter,
    retry: RetryExecutor,
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("login_url", &self.login_url)
            .field("credentials", &self.credentials.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .field("cookies", &self.jar.len())
            .field("cache_key", &self.cache_key)
            .finish_non_exhaustive()
    }
}

impl SessionClient {
    /// Starts building a client that logs in at `login_url`.
    #[must_use]
    pub fn builder(login_url: impl Into<String>) -> SessionClientBuilder {
        SessionClientBuilder::new(login_url)
    }

    /// Returns the login URL.
    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the cookie jar.
    #[must_use]
    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }

    /// Returns the key under which the jar is persisted.
    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Whether the jar holds a usable cookie for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidUrl`] if `url` does not parse.
    pub fn has_session_for(&self, url: &str) -> Result<bool, SessionError> {
        let target = parse_url(url)?;
        Ok(!self.jar.cookies_for(&target, self.clock.now()).is_empty())
    }

    /// Fetches `url`, logging in first when no cookie matches it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the URL is invalid, login fails, or every
    /// attempt of the request fails.
    pub async fn fetch(&mut self, url: &str, options: RequestOptions) -> Result<Response, SessionError> {
        self.fetch_with(url, options, true).await
    }

    /// Fetches `url`; the login flow only runs when `attempt_login` is set.
    ///
    /// # Errors
    ///
    /// See [`fetch`](Self::fetch).
    #[instrument(skip(self, options))]
    pub async fn fetch_with(
        &mut self,
        url: &str,
        options: RequestOptions,
        attempt_login: bool,
    ) -> Result<Response, SessionError> {
        let target = parse_url(url)?;

        if attempt_login && self.jar.cookies_for(&target, self.clock.now()).is_empty() {
            debug!("no session cookie for target, logging in");
            self.login().await?;
        }

        self.send(url, &target, options).await
    }

    /// Runs the login flow unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::LoginFailed`] when the credential POST sets no
    /// cookie, or any error from fetching the login page or posting the form.
    #[instrument(skip(self), fields(login_url = %self.login_url))]
    pub async fn login(&mut self) -> Result<(), SessionError> {
        info!("logging in");
        let login_url = self.login_url.clone();
        let login_target = parse_url(&login_url)?;

        let page = self.send(&login_url, &login_target, RequestOptions::new()).await?;
        let form = self
            .config
            .form_extractor()
            .map_err(ConfigError::from)?
            .extract(&page.text());

        let action = resolve_action_url(&login_url, form.action.as_deref())
            .map_err(|e| SessionError::invalid_url(&login_url, e))?;
        let action_target = parse_url(&action)?;

        let mut fields = form.fields;
        fields.extend(self.credentials.clone());

        let options = RequestOptions::new()
            .method(Method::POST)
            .payload(Payload::Form(fields))
            .follow_redirects(false);
        let response = self.send(&action, &action_target, options).await?;

        if response.set_cookies().is_empty() {
            warn!(action = %action, status = response.status, "login response set no cookie");
            return Err(SessionError::login_failed(action, response.status));
        }

        info!(status = response.status, cookies = self.jar.len(), "login complete");
        Ok(())
    }

    /// Drops all cookies and removes the persisted session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Cache`] if the cache entry cannot be removed.
    pub fn clear_session(&mut self) -> Result<(), SessionError> {
        self.jar = CookieJar::with_expired_reuse(self.config.reuses_expired_cookies);
        self.cache.remove(&self.cache_key)?;
        Ok(())
    }

    async fn send(
        &mut self,
        url: &str,
        target: &Url,
        options: RequestOptions,
    ) -> Result<Response, SessionError> {
        let mut options = options.merged_over(&self.config.request_option_overrides);
        if let Some(cookie_header) = self.jar.cookie_header(target, self.clock.now()) {
            options.headers.insert("cookie".to_string(), cookie_header);
        }

        let transport = &*self.transport;
        let rate_limiter = &self.rate_limiter;
        let options = &options;
        let logging = self.config.logging_enabled;

        let response = self
            .retry
            .execute(url, move |attempt| async move {
                rate_limiter.acquire().await;
                if logging {
                    info!(url, attempt, method = %options.effective_method(), ?options, "request");
                }
                let result = transport.perform(url, options).await;
                rate_limiter.record_request();
                if logging && let Ok(response) = &result {
                    info!(url, status = response.status, headers = ?response, "response");
                }
                result
            })
            .await?;

        self.absorb_cookies(target, &response);
        Ok(response)
    }

    fn absorb_cookies(&mut self, target: &Url, response: &Response) {
        let set_cookies = response.set_cookies();
        if set_cookies.is_empty() {
            return;
        }

        let now = self.clock.now();
        for raw in set_cookies {
            if let Err(e) = self.jar.set_from_header(raw, target, now) {
                warn!(url = %target, error = %e, "ignoring unusable Set-Cookie header");
            }
        }

        if let Err(e) = self.persist(target, now) {
            warn!(key = %self.cache_key, error = %e, "failed to persist session cookies");
        }
    }

    fn persist(&self, target: &Url, now: SystemTime) -> Result<(), SessionError> {
        let ttl_secs = self
            .jar
            .minimum_remaining_ttl(target, now, self.config.cache_ttl_cap_seconds);
        let bytes = self
            .jar
            .serialize(now)
            .map_err(|e| SessionError::Serialization(e.to_string()))?;
        self.cache.put(&self.cache_key, &bytes, ttl_secs)?;
        debug!(key = %self.cache_key, ttl_secs, cookies = self.jar.len(), "persisted session cookies");
        Ok(())
    }
}

fn parse_url(url: &str) -> Result<Url, SessionError> {
    Url::parse(url).map_err(|e| SessionError::invalid_url(url, e))
}

/// Builder for [`SessionClient`].
///
/// Unset capabilities default to [`ReqwestTransport`], [`InMemoryCache`],
/// [`SystemClock`] and [`TokioSleeper`].
#[must_use]
pub struct SessionClientBuilder {
    login_url: String,
    credentials: BTreeMap<String, FormValue>,
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    cache: Option<Arc<dyn KeyValueCache>>,
    clock: Option<Arc<dyn Clock>>,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl SessionClientBuilder {
    fn new(login_url: impl Into<String>) -> Self {
        Self {
            login_url: login_url.into(),
            credentials: BTreeMap::new(),
            config: ClientConfig::default(),
            transport: None,
            cache: None,
            clock: None,
            sleeper: None,
        }
    }

    /// Adds a credential field posted with the login form.
    pub fn credential(mut self, name: impl Into<String>, value: impl Into<FormValue>) -> Self {
        self.credentials.insert(name.into(), value.into());
        self
    }

    /// Adds several credential fields.
    pub fn credentials(mut self, fields: impl IntoIterator<Item = (String, FormValue)>) -> Self {
        self.credentials.extend(fields);
        self
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the persistence backend.
    pub fn cache(mut self, cache: Arc<dyn KeyValueCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the time source.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the sleep implementation used for throttling and backoff.
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Validates the configuration and restores any persisted cookies.
    ///
    /// A persisted jar that cannot be read is discarded with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] for an invalid login URL or configuration, or
    /// when the default transport cannot be built.
    pub fn build(self) -> Result<SessionClient, SessionError> {
        parse_url(&self.login_url)?;
        self.config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let sleeper = self.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(InMemoryCache::new(Arc::clone(&clock))));

        let cache_key = cache_key_for(&self.login_url);
        let jar = restore_jar(&*cache, &cache_key, self.config.reuses_expired_cookies);

        let rate_limiter = RateLimiter::new(
            Duration::from_millis(self.config.least_interval_millis),
            Arc::clone(&clock),
            Arc::clone(&sleeper),
        );
        let retry = RetryExecutor::new(self.config.max_retry_count, sleeper);

        Ok(SessionClient {
            login_url: self.login_url,
            credentials: self.credentials,
            config: self.config,
            jar,
            cache_key,
            transport,
            cache,
            clock,
            rate_limiter,
            retry,
        })
    }
}

fn restore_jar(cache: &dyn KeyValueCache, key: &str, reuse_expired: bool) -> CookieJar {
    let bytes = match cache.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return CookieJar::with_expired_reuse(reuse_expired),
        Err(e) => {
            warn!(key, error = %e, "failed to read persisted session, starting empty");
            return CookieJar::with_expired_reuse(reuse_expired);
        }
    };

    match CookieJar::deserialize(&bytes, reuse_expired) {
        Ok(jar) => {
            debug!(key, cookies = jar.len(), "restored persisted session");
            jar
        }
        Err(e) => {
            warn!(key, error = %e, "discarding unreadable persisted session");
            CookieJar::with_expired_reuse(reuse_expired)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::UNIX_EPOCH;

    use async_trait::async_trait;

    use super::*;
    use crate::clock::ManualClock;
    use crate::request::TransportError;
    use crate::session::config::MAX_CACHE_TTL_CAP_SECONDS;

    const LOGIN_URL: &str = "https://host/path/login";

    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<Response, TransportError>>>,
        seen: Mutex<Vec<(String, RequestOptions)>>,
    }

    impl ScriptedTransport {
        fn reply(&self, status: u16, headers: &[(&str, &str)], body: &str) {
            let headers = headers
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect();
            self.replies
                .lock()
                .unwrap()
                .push_back(Ok(Response::new(status, headers, body.as_bytes().to_vec())));
        }

        fn seen(&self) -> Vec<(String, RequestOptions)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn perform(&self, url: &str, options: &RequestOptions) -> Result<Response, TransportError> {
            self.seen.lock().unwrap().push((url.to_string(), options.clone()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::network(url, "no scripted reply")))
        }
    }

    struct Harness {
        transport: Arc<ScriptedTransport>,
        cache: InMemoryCache,
        clock: ManualClock,
    }

    impl Harness {
        fn new() -> Self {
            let clock = ManualClock::new(UNIX_EPOCH + Duration::from_secs(1_700_000_000));
            Self {
                transport: Arc::new(ScriptedTransport::default()),
                cache: InMemoryCache::new(Arc::new(clock.clone())),
                clock,
            }
        }

        fn client(&self, config: ClientConfig) -> SessionClient {
            SessionClient::builder(LOGIN_URL)
                .credential("user", "alice")
                .credential("pass", "s3cret")
                .config(config)
                .transport(self.transport.clone())
                .cache(Arc::new(self.cache.clone()))
                .clock(Arc::new(self.clock.clone()))
                .sleeper(Arc::new(self.clock.clone()))
                .build()
                .unwrap()
        }
    }

    fn fast_config() -> ClientConfig {
        ClientConfig {
            least_interval_millis: 0,
            ..ClientConfig::default()
        }
    }

    const LOGIN_PAGE: &str = r#"<form action="do-login" method="post">
        <input type="hidden" name="csrf" value="tok">
        <input name="user" value="">
        <input name="pass" value="">
        <input type="submit" name="go" value="Sign in">
    </form>"#;

    #[test]
    fn test_cache_key_prefix_and_truncation() {
        assert_eq!(cache_key_for("https://host/login"), "SessionClient.https://host/login");

        let long_url = format!("https://host/{}", "a".repeat(400));
        let key = cache_key_for(&long_url);
        assert_eq!(key.chars().count(), MAX_CACHE_KEY_CHARS);
        assert!(key.starts_with("SessionClient.https://host/aaa"));
    }

    #[test]
    fn test_cache_key_truncates_on_char_boundary() {
        let long_url = format!("https://host/{}", "é".repeat(300));
        let key = cache_key_for(&long_url);
        assert_eq!(key.chars().count(), MAX_CACHE_KEY_CHARS);
    }

    #[test]
    fn test_build_rejects_invalid_login_url_and_config() {
        let result = SessionClient::builder("not a url")
            .transport(Arc::new(ScriptedTransport::default()))
            .build();
        assert!(matches!(result, Err(SessionError::InvalidUrl { .. })));

        let result = SessionClient::builder(LOGIN_URL)
            .config(ClientConfig {
                max_retry_count: 0,
                ..ClientConfig::default()
            })
            .transport(Arc::new(ScriptedTransport::default()))
            .build();
        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    #[test]
    fn test_build_rejects_unbounded_ttl_cap() {
        let config = ClientConfig::from_json_str(r#"{"cacheTtlCapSeconds": 18446744073709551615}"#);
        assert!(config.is_err());

        let result = SessionClient::builder(LOGIN_URL)
            .config(ClientConfig {
                cache_ttl_cap_seconds: u64::MAX,
                ..ClientConfig::default()
            })
            .transport(Arc::new(ScriptedTransport::default()))
            .build();
        assert!(matches!(
            result,
            Err(SessionError::Config(ConfigError::OutOfRange { field: "cacheTtlCapSeconds", .. }))
        ));
    }

    #[tokio::test]
    async fn test_session_cookie_persists_with_largest_ttl_cap() {
        let h = Harness::new();
        h.transport.reply(200, &[("Set-Cookie", "sid=1; Path=/")], "ok");
        let mut client = h.client(ClientConfig {
            cache_ttl_cap_seconds: MAX_CACHE_TTL_CAP_SECONDS,
            ..fast_config()
        });

        client
            .fetch_with("https://host/x", RequestOptions::new(), false)
            .await
            .unwrap();

        assert_eq!(
            h.cache.ttl(client.cache_key()),
            Some(Duration::from_secs(MAX_CACHE_TTL_CAP_SECONDS))
        );
    }

    #[tokio::test]
    async fn test_fetch_without_cookies_logs_in_then_sends_cookie() {
        let h = Harness::new();
        h.transport.reply(200, &[], LOGIN_PAGE);
        h.transport.reply(302, &[("Set-Cookie", "sid=abc; Path=/"), ("Location", "/home")], "");
        h.transport.reply(200, &[], "secret data");
        let mut client = h.client(fast_config());

        let response = client.fetch("https://host/data", RequestOptions::new()).await.unwrap();

        assert_eq!(response.text(), "secret data");
        let seen = h.transport.seen();
        assert_eq!(seen.len(), 3);

        assert_eq!(seen[0].0, LOGIN_URL);
        assert_eq!(seen[0].1.effective_method(), Method::GET);

        assert_eq!(seen[1].0, "https://host/path/do-login");
        assert_eq!(seen[1].1.effective_method(), Method::POST);
        assert_eq!(seen[1].1.follow_redirects, Some(false));
        let body = seen[1].1.payload.as_ref().unwrap().encode();
        assert_eq!(body, "csrf=tok&go=Sign%20in&pass=s3cret&user=alice");

        assert_eq!(seen[2].0, "https://host/data");
        assert_eq!(seen[2].1.header_value("cookie"), Some("sid=abc"));
    }

    #[tokio::test]
    async fn test_login_without_set_cookie_fails() {
        let h = Harness::new();
        h.transport.reply(200, &[], LOGIN_PAGE);
        h.transport.reply(200, &[], "wrong password");
        let mut client = h.client(fast_config());

        let error = client.fetch("https://host/data", RequestOptions::new()).await.unwrap_err();

        assert!(matches!(error, SessionError::LoginFailed { status: 200, .. }));
        assert_eq!(h.transport.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_with_login_suppressed_skips_login() {
        let h = Harness::new();
        h.transport.reply(200, &[], "public");
        let mut client = h.client(fast_config());

        let response = client
            .fetch_with("https://host/public", RequestOptions::new(), false)
            .await
            .unwrap();

        assert_eq!(response.text(), "public");
        assert_eq!(h.transport.seen().len(), 1);
        assert_eq!(h.transport.seen()[0].1.header_value("cookie"), None);
    }

    #[tokio::test]
    async fn test_persisted_session_is_reused_by_next_client() {
        let h = Harness::new();
        h.transport.reply(200, &[("Set-Cookie", "sid=abc; Max-Age=600; Path=/")], "ok");
        let mut first = h.client(fast_config());
        first
            .fetch_with("https://host/a", RequestOptions::new(), false)
            .await
            .unwrap();
        assert_eq!(h.cache.ttl(first.cache_key()), Some(Duration::from_secs(600)));

        h.transport.reply(200, &[], "cached");
        let mut second = h.client(fast_config());
        assert!(second.has_session_for("https://host/b").unwrap());
        second.fetch("https://host/b", RequestOptions::new()).await.unwrap();

        let seen = h.transport.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].1.header_value("cookie"), Some("sid=abc"));
    }

    #[tokio::test]
    async fn test_corrupted_cache_entry_starts_empty() {
        let h = Harness::new();
        h.cache.put(&cache_key_for(LOGIN_URL), b"{not json", 600).unwrap();

        let client = h.client(fast_config());

        assert!(client.jar().is_empty());
    }

    #[tokio::test]
    async fn test_request_option_overrides_lose_to_caller() {
        let h = Harness::new();
        h.transport.reply(200, &[], "ok");
        let config = ClientConfig {
            request_option_overrides: RequestOptions::new()
                .header("x-client", "base")
                .header("accept", "text/html"),
            ..fast_config()
        };
        let mut client = h.client(config);

        client
            .fetch_with(
                "https://host/x",
                RequestOptions::new().header("X-Client", "caller"),
                false,
            )
            .await
            .unwrap();

        let options = &h.transport.seen()[0].1;
        assert_eq!(options.header_value("x-client"), Some("caller"));
        assert_eq!(options.header_value("accept"), Some("text/html"));
    }

    #[tokio::test]
    async fn test_unparseable_set_cookie_is_ignored() {
        let h = Harness::new();
        h.transport.reply(
            200,
            &[("Set-Cookie", "garbage"), ("Set-Cookie", "good=1; Path=/")],
            "ok",
        );
        let mut client = h.client(fast_config());

        client
            .fetch_with("https://host/x", RequestOptions::new(), false)
            .await
            .unwrap();

        assert_eq!(client.jar().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_session_forgets_cookies() {
        let h = Harness::new();
        h.transport.reply(200, &[("Set-Cookie", "sid=abc; Path=/")], "ok");
        let mut client = h.client(fast_config());
        client
            .fetch_with("https://host/x", RequestOptions::new(), false)
            .await
            .unwrap();
        assert!(h.cache.get(client.cache_key()).unwrap().is_some());

        client.clear_session().unwrap();

        assert!(client.jar().is_empty());
        assert!(h.cache.get(client.cache_key()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_target_url_is_rejected_before_any_request() {
        let h = Harness::new();
        let mut client = h.client(fast_config());

        let error = client.fetch("::nope::", RequestOptions::new()).await.unwrap_err();

        assert!(matches!(error, SessionError::InvalidUrl { .. }));
        assert!(h.transport.seen().is_empty());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    async fn fetch_with_cookie_capturing_logs(logging_enabled: bool) -> String {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let h = Harness::new();
        h.transport.reply(200, &[("Set-Cookie", "sid=first-secret; Path=/")], "ok");
        h.transport.reply(200, &[("X-Trace", "t-1")], "ok");
        let mut client = h.client(ClientConfig {
            logging_enabled,
            ..fast_config()
        });
        client
            .fetch_with("https://host/x", RequestOptions::new(), false)
            .await
            .unwrap();
        client
            .fetch_with("https://host/y", RequestOptions::new(), false)
            .await
            .unwrap();

        logs.text()
    }

    #[tokio::test]
    async fn test_logging_enabled_emits_redacted_request_and_response() {
        let output = fetch_with_cookie_capturing_logs(true).await;

        assert!(output.contains("request"), "{output}");
        assert!(output.contains("response"), "{output}");
        assert!(output.contains("https://host/y"), "{output}");
        assert!(output.contains("status=200"), "{output}");
        assert!(output.contains("x-trace"), "{output}");
        assert!(output.contains("[REDACTED]"), "{output}");
        assert!(!output.contains("first-secret"), "{output}");
    }

    #[tokio::test]
    async fn test_logging_disabled_emits_no_request_events() {
        let output = fetch_with_cookie_capturing_logs(false).await;

        assert!(!output.contains(" request"), "{output}");
        assert!(!output.contains(" response"), "{output}");
        assert!(!output.contains("first-secret"), "{output}");
    }
}
