//! Command-line input validation.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Characters GitHub accepts in owner and repository names.
const NAME_PATTERN: &str = r"[a-zA-Z0-9\-._]+";

/// Names that match the pattern but resolve as path segments.
fn is_reserved(name: &str) -> bool {
    matches!(name, "." | "..")
}

#[allow(clippy::expect_used)]
static ISSUE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^https?://github\.com/({NAME_PATTERN})/({NAME_PATTERN})/issues/([0-9]+)(?:[/?#].*)?$"
    ))
    .expect("issue URL pattern is valid")
});

#[allow(clippy::expect_used)]
static REPO_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^{NAME_PATTERN}$")).expect("repo name pattern is valid")
});

/// Malformed command-line input. Always fatal, raised before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Please pass the PM issue URL as the 1st argument")]
    MissingIssueUrl,

    #[error("Invalid URL")]
    InvalidIssueUrl,

    #[error("Please pass the default repo to open issues as 2nd argument")]
    MissingDefaultRepo,

    #[error("Invalid default repo. Found Invalid characters")]
    InvalidDefaultRepo,
}

/// The PM issue being split and where its tasks land by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInput {
    pub owner: String,
    pub repo: String,
    pub issue_number: u64,
    pub default_repo: String,
}

impl UserInput {
    /// Browser URL of the PM issue.
    pub fn issue_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/issues/{}",
            self.owner, self.repo, self.issue_number
        )
    }
}

/// Validates the two positional arguments.
///
/// The URL is checked first, so a bad URL is reported even when the default
/// repo is also missing.
pub fn parse_input(
    pm_issue_url: Option<&str>,
    default_repo: Option<&str>,
) -> Result<UserInput, InputError> {
    let url = pm_issue_url
        .filter(|u| !u.is_empty())
        .ok_or(InputError::MissingIssueUrl)?;
    let captures = ISSUE_URL.captures(url).ok_or(InputError::InvalidIssueUrl)?;
    if is_reserved(&captures[1]) || is_reserved(&captures[2]) {
        return Err(InputError::InvalidIssueUrl);
    }
    let issue_number = captures[3]
        .parse::<u64>()
        .map_err(|_| InputError::InvalidIssueUrl)?;

    let default_repo = default_repo
        .filter(|r| !r.is_empty())
        .ok_or(InputError::MissingDefaultRepo)?;
    if !REPO_NAME.is_match(default_repo) || is_reserved(default_repo) {
        return Err(InputError::InvalidDefaultRepo);
    }

    Ok(UserInput {
        owner: captures[1].to_string(),
        repo: captures[2].to_string(),
        issue_number,
        default_repo: default_repo.to_string(),
    })
}
