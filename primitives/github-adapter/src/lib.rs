//! GitHub Adapter - thin REST client
//!
//! Wraps the GitHub v3 REST API with one authenticated request per call
//! (GET/POST/PUT/DELETE). Every response is normalized into an [`Envelope`]
//! carrying the parsed JSON body, the pagination links from the `Link`
//! header, and the raw status and headers.
//!
//! Status codes above 299 are errors even when the transport succeeded.
//! There are no retries and no pagination traversal.
//!
//! # Usage
//!
//! ```no_run
//! # async fn demo() -> github_adapter::Result<()> {
//! use github_adapter::{Adapter, NewIssue};
//!
//! let adapter = Adapter::new("0123456789abcdef0123456789abcdef01234567")?;
//! let issue = adapter.get_issue("acme", "widgets", 42).await?;
//! adapter
//!     .post_issue("acme", "backend", &NewIssue {
//!         title: format!("DEV {}.1 follow-up", issue.number),
//!         body: issue.body.unwrap_or_default(),
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod endpoints;
pub mod error;
pub mod links;
pub mod response;

pub use adapter::{Adapter, AdapterBuilder, DEFAULT_BASE_URL, GITHUB_V3_ACCEPT};
pub use endpoints::{Issue, NewIssue, RateLimit, RateLimitBucket, User};
pub use error::{GitHubError, Result};
pub use links::{PageLinks, parse_link_header};
pub use response::{Envelope, RawBody, RawResponse, parse_response};
