//! Typed wrappers over the handful of GitHub endpoints the splitter needs.

use crate::adapter::Adapter;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A GitHub issue, reduced to the fields the splitter reads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    /// Markdown body. GitHub sends `null` for issues created without one.
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Payload for `POST /repos/{owner}/{repo}/issues`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
}

/// The authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One rate-limit bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimitBucket {
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp at which the window resets.
    pub reset: u64,
}

/// Response of `GET /rate_limit`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RateLimit {
    pub resources: RateLimitResources,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimitBucket,
}

impl Adapter {
    /// `GET /rate_limit`
    pub async fn rate_limit(&self) -> Result<RateLimit> {
        self.get("/rate_limit").await?.into_result()?.json()
    }

    /// `GET /user`
    pub async fn current_user(&self) -> Result<User> {
        self.get("/user").await?.into_result()?.json()
    }

    /// `GET /repos/{owner}/{repo}/issues/{number}`
    pub async fn get_issue(&self, owner: &str, repo: &str, number: u64) -> Result<Issue> {
        self.get(&format!("/repos/{owner}/{repo}/issues/{number}"))
            .await?
            .into_result()?
            .json()
    }

    /// `POST /repos/{owner}/{repo}/issues`, returning the created issue.
    pub async fn post_issue(&self, owner: &str, repo: &str, issue: &NewIssue) -> Result<Issue> {
        self.post(&format!("/repos/{owner}/{repo}/issues"), issue)
            .await?
            .into_result()?
            .json()
    }
}
