//! Sub-tasks derived from a PM issue.

use crate::input::UserInput;
use github_adapter::NewIssue;

/// One unit of work that becomes its own issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Position label within the PM issue, e.g. `3` or `3.2`.
    pub ordinal: String,
    pub title: String,
    /// Target repository under the PM issue's owner. `None` means the default repo.
    pub repo: Option<String>,
    pub description: String,
}

impl Task {
    pub fn new(
        ordinal: impl Into<String>,
        title: impl Into<String>,
        repo: Option<&str>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            ordinal: ordinal.into(),
            title: title.into(),
            repo: repo.map(str::to_string),
            description: description.into(),
        }
    }

    /// Repository the issue is opened in.
    pub fn target_repo<'a>(&'a self, input: &'a UserInput) -> &'a str {
        self.repo.as_deref().unwrap_or(&input.default_repo)
    }

    /// Issue payload: `DEV <pm>.<ordinal> <title>`, body linking back to the PM issue.
    pub fn to_new_issue(&self, input: &UserInput) -> NewIssue {
        NewIssue {
            title: format!("DEV {}.{} {}", input.issue_number, self.ordinal, self.title),
            body: format!("{}\n\n{}", input.issue_url(), self.description),
        }
    }
}

/// Turns a PM issue body into tasks.
pub trait TaskSource {
    fn tasks(&self, body: &str) -> Vec<Task>;
}

/// Fixed task list used until a real body parser exists. Ignores the body.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderTaskSource;

impl TaskSource for PlaceholderTaskSource {
    fn tasks(&self, _body: &str) -> Vec<Task> {
        vec![
            Task::new("1", "Dev task complete", Some("testApi"), "sample description"),
            Task::new(
                "2",
                "Test task complete",
                Some("testApi"),
                "sample multiline description.\nThis is just another comment",
            ),
            Task::new("3.1", "do something", Some("testWWW"), ""),
            Task::new("3.2", "do something stage 2", Some("testWWW"), ""),
            Task::new("3.3", "do something stage 2", Some("testWWW"), ""),
            Task::new("4", "docs update", Some("testWWW"), ""),
        ]
    }
}
