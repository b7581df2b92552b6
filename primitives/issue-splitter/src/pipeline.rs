//! The split run, as an ordered list of steps.
//!
//! Each step returns a `Result`; the first error stops the run. Steps only
//! share the immutable [`Settings`] and the values earlier steps returned.

use crate::config::{self, CredentialStore, Token};
use crate::input::{UserInput, parse_input};
use crate::prompt::TokenPrompt;
use crate::tasks::{Task, TaskSource};
use anyhow::{Context, Result};
use futures::future::join_all;
use github_adapter::{Adapter, Issue};
use std::path::PathBuf;
use std::time::Duration;

const USER_AGENT: &str = concat!("issue-splitter/", env!("CARGO_PKG_VERSION"));

/// Everything a run needs, fixed before the first step.
#[derive(Debug, Clone)]
pub struct Settings {
    pub pm_issue_url: Option<String>,
    pub default_repo: Option<String>,
    pub config_path: PathBuf,
    pub api_url: String,
    pub verify_token: bool,
    pub max_token_attempts: Option<u32>,
    pub connect_timeout: Option<Duration>,
}

/// An issue opened for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub ordinal: String,
    pub repo: String,
    pub number: u64,
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct Summary {
    pub source: UserInput,
    pub created: Vec<CreatedIssue>,
}

/// Runs every step in order.
pub async fn run(
    settings: &Settings,
    prompt: &mut dyn TokenPrompt,
    task_source: &dyn TaskSource,
) -> Result<Summary> {
    tracing::info!("Starting issue-splitter");

    let input = parse_input(settings.pm_issue_url.as_deref(), settings.default_repo.as_deref())?;
    let token = config::bootstrap(
        &CredentialStore::new(&settings.config_path),
        prompt,
        settings.max_token_attempts,
    )?;
    let adapter = initialize_adapter(settings, &token)?;
    if settings.verify_token {
        verify_credential(&adapter).await?;
    }

    let issue = get_issue(&adapter, &input).await?;
    let body = issue.body.unwrap_or_default();
    println!("{body}");

    let tasks = task_source.tasks(&body);
    println!("\n{} task(s) parsed", tasks.len());

    let created = create_issues(&adapter, &input, &tasks).await?;
    Ok(Summary {
        source: input,
        created,
    })
}

fn initialize_adapter(settings: &Settings, token: &Token) -> Result<Adapter> {
    tracing::debug!("Inside initialize_adapter");

    let mut builder = Adapter::builder(token.as_str())
        .base_url(&settings.api_url)
        .user_agent(USER_AGENT);
    if let Some(timeout) = settings.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    builder.build().context("failed to initialize the GitHub adapter")
}

/// Confirms the token works and reports the remaining core quota.
async fn verify_credential(adapter: &Adapter) -> Result<()> {
    tracing::debug!("Inside verify_credential");

    let user = adapter
        .current_user()
        .await
        .context("github token was rejected")?;
    let limits = adapter
        .rate_limit()
        .await
        .context("failed to read the rate limit")?;
    let core = limits.resources.core;
    tracing::info!(
        login = %user.login,
        remaining = core.remaining,
        limit = core.limit,
        "authenticated"
    );
    Ok(())
}

async fn get_issue(adapter: &Adapter, input: &UserInput) -> Result<Issue> {
    tracing::debug!("Inside get_issue");

    adapter
        .get_issue(&input.owner, &input.repo, input.issue_number)
        .await
        .with_context(|| format!("failed to fetch PM issue {}", input.issue_url()))
}

/// Opens one issue per task.
///
/// All calls are dispatched together and every one runs to completion. The
/// run fails with the first error in task order; issues that were created
/// stay created.
pub async fn create_issues(
    adapter: &Adapter,
    input: &UserInput,
    tasks: &[Task],
) -> Result<Vec<CreatedIssue>> {
    tracing::debug!("Inside create_issues");

    let calls = tasks.iter().map(|task| {
        let repo = task.target_repo(input);
        let payload = task.to_new_issue(input);
        async move { adapter.post_issue(&input.owner, repo, &payload).await }
    });
    let results = join_all(calls).await;

    let mut created = Vec::with_capacity(tasks.len());
    let mut first_error = None;
    for (task, result) in tasks.iter().zip(results) {
        let repo = task.target_repo(input);
        match result {
            Ok(issue) => {
                tracing::info!(task = %task.ordinal, repo, number = issue.number, "issue created");
                created.push(CreatedIssue {
                    ordinal: task.ordinal.clone(),
                    repo: repo.to_string(),
                    number: issue.number,
                });
            }
            Err(e) => {
                tracing::error!(task = %task.ordinal, repo, error = %e, "issue creation failed");
                first_error.get_or_insert_with(|| {
                    anyhow::Error::new(e).context(format!(
                        "failed to create issue for task {} in {}/{}",
                        task.ordinal, input.owner, repo
                    ))
                });
            }
        }
    }

    match first_error {
        Some(err) => Err(err.context(format!(
            "{} of {} issue(s) created",
            created.len(),
            tasks.len()
        ))),
        None => Ok(created),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::PlaceholderTaskSource;
    use axum::{
        Json, Router,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
        routing::{get, post},
    };
    use serde_json::{Value, json};
    use std::io;
    use std::sync::{Arc, Mutex};

    const TOKEN: &str = "0123456789abcdef0123456789abcdef01234567";

    #[derive(Clone, Default)]
    struct MockGitHub {
        fetched: Arc<Mutex<Vec<String>>>,
        posted: Arc<Mutex<Vec<(String, Value)>>>,
    }

    async fn issue(
        State(mock): State<MockGitHub>,
        Path((owner, repo, number)): Path<(String, String, u64)>,
    ) -> impl IntoResponse {
        mock.fetched
            .lock()
            .unwrap()
            .push(format!("{owner}/{repo}#{number}"));
        Json(json!({
            "number": number,
            "title": "PM issue",
            "body": "- [ ] api work\n- [ ] docs"
        }))
    }

    async fn create(
        State(mock): State<MockGitHub>,
        Path((_owner, repo)): Path<(String, String)>,
        Json(payload): Json<Value>,
    ) -> impl IntoResponse {
        let number = {
            let mut posted = mock.posted.lock().unwrap();
            posted.push((repo.clone(), payload.clone()));
            posted.len() as u64 + 100
        };
        if repo == "broken" {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Server Error" })),
            )
                .into_response();
        }
        (
            StatusCode::CREATED,
            Json(json!({ "number": number, "title": payload["title"], "body": payload["body"] })),
        )
            .into_response()
    }

    async fn user() -> impl IntoResponse {
        Json(json!({ "login": "octocat" }))
    }

    async fn rate_limit() -> impl IntoResponse {
        Json(json!({ "resources": { "core": { "limit": 5000, "remaining": 4999, "reset": 0 } } }))
    }

    async fn spawn_server(mock: MockGitHub) -> String {
        let app = Router::new()
            .route("/user", get(user))
            .route("/rate_limit", get(rate_limit))
            .route("/repos/{owner}/{repo}/issues/{number}", get(issue))
            .route("/repos/{owner}/{repo}/issues", post(create))
            .with_state(mock);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    struct NoPrompt;

    impl TokenPrompt for NoPrompt {
        fn read_token(&mut self) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no terminal in tests"))
        }
    }

    struct OnePrompt(Option<String>);

    impl TokenPrompt for OnePrompt {
        fn read_token(&mut self) -> io::Result<String> {
            self.0
                .take()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "exhausted"))
        }
    }

    struct FixedTasks(Vec<Task>);

    impl TaskSource for FixedTasks {
        fn tasks(&self, _body: &str) -> Vec<Task> {
            self.0.clone()
        }
    }

    fn settings(api_url: &str, config_path: PathBuf) -> Settings {
        Settings {
            pm_issue_url: Some("https://github.com/acme/widgets/issues/42".into()),
            default_repo: Some("backend".into()),
            config_path,
            api_url: api_url.to_string(),
            verify_token: false,
            max_token_attempts: None,
            connect_timeout: None,
        }
    }

    fn write_config(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join(".config.json");
        std::fs::write(&path, format!(r#"{{ "githubToken": "{TOKEN}" }}"#)).unwrap();
        path
    }

    #[tokio::test]
    async fn creates_one_issue_per_task_in_each_target_repo() {
        let mock = MockGitHub::default();
        let base = spawn_server(mock.clone()).await;
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&base, write_config(&dir));

        let summary = run(&settings, &mut NoPrompt, &PlaceholderTaskSource)
            .await
            .unwrap();

        assert_eq!(summary.source.issue_number, 42);
        assert_eq!(summary.created.len(), 6);
        assert_eq!(*mock.fetched.lock().unwrap(), ["acme/widgets#42"]);

        let posted = mock.posted.lock().unwrap();
        assert_eq!(posted.len(), 6);
        let mut repos: Vec<_> = posted.iter().map(|(repo, _)| repo.as_str()).collect();
        repos.sort_unstable();
        assert_eq!(repos, ["testApi", "testApi", "testWWW", "testWWW", "testWWW", "testWWW"]);

        let first = posted
            .iter()
            .find(|(_, p)| p["title"] == "DEV 42.1 Dev task complete")
            .unwrap();
        assert_eq!(
            first.1["body"],
            "https://github.com/acme/widgets/issues/42\n\nsample description"
        );
    }

    #[tokio::test]
    async fn tasks_without_repo_go_to_default_repo() {
        let mock = MockGitHub::default();
        let base = spawn_server(mock.clone()).await;
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&base, write_config(&dir));
        let tasks = FixedTasks(vec![
            Task::new("1", "schema", None, ""),
            Task::new("2", "client", Some("frontend"), "wire it up"),
        ]);

        let summary = run(&settings, &mut NoPrompt, &tasks).await.unwrap();

        let repos: Vec<_> = summary.created.iter().map(|c| c.repo.as_str()).collect();
        assert_eq!(repos, ["backend", "frontend"]);
    }

    #[tokio::test]
    async fn one_failing_task_fails_the_run_but_siblings_still_run() {
        let mock = MockGitHub::default();
        let base = spawn_server(mock.clone()).await;
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&base, write_config(&dir));
        let tasks = FixedTasks(vec![
            Task::new("1", "ok before", None, ""),
            Task::new("2", "fails", Some("broken"), ""),
            Task::new("3", "ok after", None, ""),
        ]);

        let err = run(&settings, &mut NoPrompt, &tasks).await.unwrap_err();

        assert_eq!(mock.posted.lock().unwrap().len(), 3);
        let message = format!("{err:#}");
        assert!(message.contains("2 of 3 issue(s) created"), "{message}");
        assert!(message.contains("task 2 in acme/broken"), "{message}");
        let status = err
            .chain()
            .find_map(|e| e.downcast_ref::<github_adapter::GitHubError>())
            .and_then(|e| e.status());
        assert_eq!(status, Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[tokio::test]
    async fn invalid_url_fails_before_any_network_call() {
        let mock = MockGitHub::default();
        let base = spawn_server(mock.clone()).await;
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(&base, dir.path().join(".config.json"));
        settings.pm_issue_url = Some("https://github.com/acme/widgets".into());

        let err = run(&settings, &mut NoPrompt, &PlaceholderTaskSource)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid URL");
        assert!(mock.fetched.lock().unwrap().is_empty());
        assert!(mock.posted.lock().unwrap().is_empty());
        assert!(!dir.path().join(".config.json").exists());
    }

    #[tokio::test]
    async fn missing_config_prompts_and_persists_token() {
        let mock = MockGitHub::default();
        let base = spawn_server(mock.clone()).await;
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".config.json");
        let mut settings = settings(&base, config_path.clone());
        settings.verify_token = true;

        let mut prompt = OnePrompt(Some(TOKEN.to_string()));
        let tasks = FixedTasks(vec![Task::new("1", "only", None, "")]);
        let summary = run(&settings, &mut prompt, &tasks).await.unwrap();

        assert_eq!(summary.created.len(), 1);
        let saved = std::fs::read_to_string(&config_path).unwrap();
        assert!(saved.contains(TOKEN));
    }

    #[tokio::test]
    async fn unreachable_api_aborts_before_creating_issues() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings("http://127.0.0.1:1", write_config(&dir));

        let err = run(&settings, &mut NoPrompt, &PlaceholderTaskSource)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to fetch PM issue"));
    }
}
