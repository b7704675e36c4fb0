//! reqwest-backed [`Transport`].
//!
//! Redirect handling in reqwest is a client-level policy, so two clients are
//! kept: one that follows redirects and one that never does. Each request
//! picks one from its `follow_redirects` option. reqwest's own cookie store
//! stays disabled; cookies belong to the session's jar.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, MAX_REDIRECTS, READ_TIMEOUT_SECS};
use super::options::{RequestOptions, Response};
use super::transport::{Transport, TransportError};
use crate::user_agent;

/// HTTP transport built on a pair of reqwest clients.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    following: Client,
    non_following: Client,
}

impl ReqwestTransport {
    /// Creates a transport with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a transport with explicit timeout values.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot be initialized.
    #[instrument(level = "debug")]
    pub fn with_timeouts(
        connect_timeout_secs: u64,
        read_timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let following = base_client_builder(connect_timeout_secs, read_timeout_secs)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        let non_following = base_client_builder(connect_timeout_secs, read_timeout_secs)
            .redirect(Policy::none())
            .build()?;
        Ok(Self {
            following,
            non_following,
        })
    }

    fn client_for(&self, options: &RequestOptions) -> &Client {
        if options.follow_redirects.unwrap_or(true) {
            &self.following
        } else {
            &self.non_following
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, options), fields(method = %options.effective_method()))]
    async fn perform(
        &self,
        url: &str,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        let parsed = Url::parse(url).map_err(|_| TransportError::invalid_url(url))?;

        let mut request = self
            .client_for(options)
            .request(options.effective_method(), parsed);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(payload) = &options.payload {
            if options.header_value("content-type").is_none()
                && let Some(content_type) = payload.content_type()
            {
                request = request.header(CONTENT_TYPE, content_type);
            }
            request = request.body(payload.encode());
        }
        if let Some(secs) = options.timeout_secs {
            request = request.timeout(Duration::from_secs(secs));
        }

        let response = request.send().await.map_err(|e| map_send_error(url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_send_error(url, e))?
            .to_vec();

        debug!(status, bytes = body.len(), "response received");
        Ok(Response::new(status, headers, body))
    }
}

fn map_send_error(url: &str, error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(url)
    } else {
        TransportError::network(url, error)
    }
}

fn base_client_builder(connect_timeout_secs: u64, read_timeout_secs: u64) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(read_timeout_secs))
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use reqwest::Method;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::request::options::{FormValue, Payload};

    #[tokio::test]
    async fn test_perform_returns_error_statuses_as_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .perform(&format!("{}/missing", server.uri()), &RequestOptions::new())
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.text(), "nope");
    }

    #[tokio::test]
    async fn test_perform_keeps_every_set_cookie_value() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cookies"))
            .respond_with(
                ResponseTemplate::new(200)
                    .append_header("set-cookie", "a=1; Path=/")
                    .append_header("set-cookie", "b=2; Path=/"),
            )
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .perform(&format!("{}/cookies", server.uri()), &RequestOptions::new())
            .await
            .unwrap();

        assert_eq!(response.set_cookies(), vec!["a=1; Path=/", "b=2; Path=/"]);
    }

    #[tokio::test]
    async fn test_perform_does_not_follow_redirect_when_disabled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", "/home")
                    .insert_header("set-cookie", "sid=abc"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/home"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let options = RequestOptions::new()
            .method(Method::POST)
            .follow_redirects(false);
        let response = transport
            .perform(&format!("{}/login", server.uri()), &options)
            .await
            .unwrap();

        assert_eq!(response.status, 302);
        assert_eq!(response.set_cookies(), vec!["sid=abc"]);
    }

    #[tokio::test]
    async fn test_perform_sends_form_payload_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(header("x-custom", "yes"))
            .and(body_string("password=p%40ss&user=me"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut fields = BTreeMap::new();
        fields.insert("user".to_string(), FormValue::from("me"));
        fields.insert("password".to_string(), FormValue::from("p@ss"));
        let options = RequestOptions::new()
            .method(Method::POST)
            .header("X-Custom", "yes")
            .payload(Payload::Form(fields));

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .perform(&format!("{}/submit", server.uri()), &options)
            .await
            .unwrap();

        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_perform_rejects_invalid_url() {
        let transport = ReqwestTransport::new().unwrap();
        let result = transport.perform("not a url", &RequestOptions::new()).await;
        assert!(matches!(result, Err(TransportError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_perform_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = ReqwestTransport::with_timeouts(2, 2).unwrap();
        let result = transport
            .perform(&format!("http://127.0.0.1:{port}/"), &RequestOptions::new())
            .await;

        assert!(matches!(result, Err(TransportError::Network { .. })));
    }
}
