//! Authenticated GitHub REST calls.
//!
//! One request per call, no retries. The adapter never follows pagination
//! links; callers get them back on the [`Envelope`].
//!
//! The verb methods fail on transport errors and on statuses above 299. A
//! body that is not valid JSON does not fail the call: it is recorded on the
//! returned envelope (see [`Envelope::parse_error`]) next to the links and the
//! raw response. [`Envelope::into_result`] turns it into an error.

use crate::error::{GitHubError, Result};
use crate::response::{Envelope, RawBody, RawResponse, parse_response};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Base URL of the public GitHub API.
pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

/// Media type pinning the v3 REST API.
pub const GITHUB_V3_ACCEPT: &str = "application/vnd.github.v3+json";

const DEFAULT_USER_AGENT: &str = concat!("github-adapter/", env!("CARGO_PKG_VERSION"));

/// A single request, built fresh for every call.
#[derive(Debug)]
struct RequestDescriptor {
    method: Method,
    url: String,
    headers: HeaderMap,
    payload: Option<Value>,
}

/// Builder for [`Adapter`].
#[derive(Debug)]
pub struct AdapterBuilder {
    token: String,
    base_url: String,
    user_agent: String,
    connect_timeout: Option<Duration>,
}

impl AdapterBuilder {
    /// Overrides the API base URL (GitHub Enterprise, test servers).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Connect timeout. Without one the transport defaults apply.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Builds the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn build(self) -> Result<Adapter> {
        let mut client = Client::builder();
        if let Some(timeout) = self.connect_timeout {
            client = client.connect_timeout(timeout);
        }

        Ok(Adapter {
            client: client.build()?,
            token: self.token,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            user_agent: self.user_agent,
        })
    }
}

/// Stateless GitHub REST adapter.
#[derive(Clone)]
pub struct Adapter {
    client: Client,
    token: String,
    base_url: String,
    user_agent: String,
}

impl std::fmt::Debug for Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adapter")
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl Adapter {
    /// Starts building an adapter for the given token.
    pub fn builder(token: impl Into<String>) -> AdapterBuilder {
        AdapterBuilder {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: None,
        }
    }

    /// Creates an adapter against the public GitHub API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::builder(token).build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues a GET request.
    pub async fn get(&self, path: &str) -> Result<Envelope> {
        let request = self.describe(Method::GET, path, None)?;
        self.execute(request).await
    }

    /// Issues a POST request with a JSON payload.
    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, payload: &T) -> Result<Envelope> {
        let request = self.describe(Method::POST, path, Some(serde_json::to_value(payload)?))?;
        self.execute(request).await
    }

    /// Issues a PUT request with a JSON payload.
    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, payload: &T) -> Result<Envelope> {
        let request = self.describe(Method::PUT, path, Some(serde_json::to_value(payload)?))?;
        self.execute(request).await
    }

    /// Issues a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<Envelope> {
        let request = self.describe(Method::DELETE, path, None)?;
        self.execute(request).await
    }

    /// Resolves a path against the base URL. Absolute URLs are used as-is.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn describe(&self, method: Method, path: &str, payload: Option<Value>) -> Result<RequestDescriptor> {
        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| GitHubError::InvalidHeader { name: "authorization" })?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .map_err(|_| GitHubError::InvalidHeader { name: "user-agent" })?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_V3_ACCEPT));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );

        Ok(RequestDescriptor {
            method,
            url: self.resolve(path),
            headers,
            payload,
        })
    }

    async fn execute(&self, request: RequestDescriptor) -> Result<Envelope> {
        let span = tracing::debug_span!("github", method = %request.method, url = %request.url);

        async move {
            let started_at = Instant::now();
            let mut builder = self
                .client
                .request(request.method, &request.url)
                .headers(request.headers);
            if let Some(payload) = &request.payload {
                builder = builder.json(payload);
            }

            let response = builder.send().await.inspect_err(|e| {
                tracing::debug!(error = %e, "request failed before a response arrived");
            })?;

            let status = response.status();
            let headers = response.headers().clone();
            let text = response.text().await?;
            tracing::debug!(
                status = status.as_u16(),
                elapsed = ?started_at.elapsed(),
                "response received"
            );

            let body = if text.is_empty() {
                RawBody::Empty
            } else {
                RawBody::Text(text)
            };

            parse_response(RawResponse::new(status, headers, body)).error_for_status()
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_and_absolute_paths() {
        let adapter = Adapter::builder("t").base_url("https://api.example.com/").build().unwrap();
        assert_eq!(adapter.resolve("/user"), "https://api.example.com/user");
        assert_eq!(adapter.resolve("rate_limit"), "https://api.example.com/rate_limit");
        assert_eq!(
            adapter.resolve("https://api.github.com/repos/a/b/issues?page=2"),
            "https://api.github.com/repos/a/b/issues?page=2"
        );
    }

    #[test]
    fn describe_sets_fixed_headers() {
        let adapter = Adapter::builder("abc").user_agent("splitter-test").build().unwrap();
        let request = adapter.describe(Method::GET, "/user", None).unwrap();

        assert_eq!(request.url, "https://api.github.com/user");
        assert_eq!(request.headers[AUTHORIZATION], "Bearer abc");
        assert!(request.headers[AUTHORIZATION].is_sensitive());
        assert_eq!(request.headers[USER_AGENT], "splitter-test");
        assert_eq!(request.headers[ACCEPT], GITHUB_V3_ACCEPT);
        assert!(request.payload.is_none());
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let adapter = Adapter::new("bad\ntoken").unwrap();
        let err = adapter.describe(Method::GET, "/user", None).unwrap_err();
        assert!(matches!(err, GitHubError::InvalidHeader { name: "authorization" }));
    }

    #[test]
    fn debug_output_hides_token() {
        let adapter = Adapter::new("secret-token-value").unwrap();
        let debug = format!("{adapter:?}");
        assert!(!debug.contains("secret-token-value"));
        assert!(debug.contains("api.github.com"));
    }
}
