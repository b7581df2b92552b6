//! Response normalization.
//!
//! Every adapter call funnels its raw response through [`parse_response`],
//! which derives pagination links and a JSON body. A body that fails to
//! deserialize is recorded on the [`Envelope`] rather than aborting, so the
//! links of that response are still available.

use crate::error::{GitHubError, Result};
use crate::links::{PageLinks, parse_link_header};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, LINK};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Body of a raw response.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBody {
    /// No payload.
    Empty,
    /// Unparsed text as received over the wire.
    Text(String),
    /// A body that is already structured and needs no deserialization.
    Json(Value),
}

/// Status, headers and body of a response before normalization.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: RawBody,
}

impl RawResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: RawBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }
}

/// Normalized result of one call.
#[derive(Debug)]
pub struct Envelope {
    raw: RawResponse,
    links: Option<PageLinks>,
    body: Option<Value>,
    parse_error: Option<serde_json::Error>,
}

impl Envelope {
    /// The response as received.
    pub fn raw(&self) -> &RawResponse {
        &self.raw
    }

    pub fn status(&self) -> StatusCode {
        self.raw.status
    }

    /// Pagination links, when the response carried a `Link` header.
    pub fn links(&self) -> Option<&PageLinks> {
        self.links.as_ref()
    }

    /// Deserialized body. `None` for empty bodies and for bodies that failed to parse.
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Deserialization failure of the body, if any.
    pub fn parse_error(&self) -> Option<&serde_json::Error> {
        self.parse_error.as_ref()
    }

    /// Consumes the envelope and returns the body.
    pub fn into_body(self) -> Option<Value> {
        self.body
    }

    /// Deserializes the body into `T`. An empty body is treated as JSON `null`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        let body = self.body.unwrap_or(Value::Null);
        Ok(serde_json::from_value(body)?)
    }

    /// Fails with [`GitHubError::Status`] when the status is above 299.
    ///
    /// A body parse failure is left on the envelope, so its links and raw
    /// response stay readable.
    pub fn error_for_status(self) -> Result<Self> {
        if self.raw.status.as_u16() > 299 {
            return Err(GitHubError::Status {
                status: self.raw.status,
                body: self.body,
                headers: Box::new(self.raw.headers),
                links: self.links,
            });
        }
        Ok(self)
    }

    /// Converts the envelope into a `Result`.
    ///
    /// A status above 299 wins over a body parse failure; both win over success.
    pub fn into_result(self) -> Result<Self> {
        let mut envelope = self.error_for_status()?;
        match envelope.parse_error.take() {
            Some(err) => Err(GitHubError::Json(err)),
            None => Ok(envelope),
        }
    }
}

/// Derives links and body from a raw response.
pub fn parse_response(raw: RawResponse) -> Envelope {
    let links = raw
        .headers
        .get(LINK)
        .and_then(|v| v.to_str().ok())
        .map(parse_link_header);

    let (body, parse_error) = match &raw.body {
        RawBody::Empty => (None, None),
        RawBody::Json(value) => (Some(value.clone()), None),
        RawBody::Text(text) if text.trim().is_empty() => (None, None),
        RawBody::Text(text) => match serde_json::from_str::<Value>(text) {
            Ok(value) => (Some(value), None),
            Err(e) => {
                tracing::debug!(error = %e, "response body is not valid JSON");
                (None, Some(e))
            }
        },
    };

    Envelope {
        raw,
        links,
        body,
        parse_error,
    }
}
