//! GitHub adapter error types.

use crate::links::PageLinks;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde_json::Value;
use thiserror::Error;

/// Errors produced by a single adapter call.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The request never produced a response (DNS, connect, TLS, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a status code above 299.
    #[error("GitHub API returned status {status}")]
    Status {
        /// Numeric status code of the response.
        status: StatusCode,
        /// Parsed response body, when the API sent valid JSON.
        body: Option<Value>,
        /// Response headers (`x-ratelimit-*`, `retry-after`, ...).
        headers: Box<HeaderMap>,
        /// Pagination links from the `Link` header, if any.
        links: Option<PageLinks>,
    },

    /// The response body was not valid JSON.
    #[error("failed to parse response body: {0}")]
    Json(#[from] serde_json::Error),

    /// A header value could not be built (e.g. a token with control characters).
    #[error("invalid header value for {name}")]
    InvalidHeader {
        /// Header name.
        name: &'static str,
    },
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, GitHubError>;

impl GitHubError {
    /// Status code carried by the error, if the API responded at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GitHubError::Status { status, .. } => Some(*status),
            GitHubError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// True when the token was rejected (HTTP 401).
    pub fn is_auth_error(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// True when the resource does not exist or is hidden from the token (HTTP 404).
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Response headers of a status error.
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            GitHubError::Status { headers, .. } => Some(&**headers),
            _ => None,
        }
    }

    /// Pagination links of a status error.
    pub fn links(&self) -> Option<&PageLinks> {
        match self {
            GitHubError::Status { links, .. } => links.as_ref(),
            _ => None,
        }
    }

    /// GitHub's `message` field from an error body, when present.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            GitHubError::Status {
                body: Some(body), ..
            } => body.get("message").and_then(Value::as_str),
            _ => None,
        }
    }
}
