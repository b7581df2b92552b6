//! Issue Splitter - PM Issue to Task Issues
//!
//! Reads a "PM issue" from GitHub, derives its sub-tasks, and opens one issue
//! per task under the PM issue's owner.
//!
//! The GitHub token is read from a local JSON file. When the file is missing,
//! the token is requested on the terminal, validated, and saved.
//!
//! # Usage
//!
//! ```bash
//! # Split issue 42 of acme/widgets, opening tasks in acme/backend by default
//! issue-splitter https://github.com/acme/widgets/issues/42 backend
//!
//! # Check the token against the API first, with debug logging
//! RUST_LOG=issue_splitter=debug issue-splitter --verify-token \
//!     https://github.com/acme/widgets/issues/42 backend
//!
//! # Keep the token somewhere else
//! issue-splitter --config ~/.config/issue-splitter.json \
//!     https://github.com/acme/widgets/issues/42 backend
//! ```
//!
//! # Issues Created
//!
//! For every task: title `DEV <pm-number>.<task> <task title>`, body
//! linking back to the PM issue followed by the task description.

mod config;
mod input;
mod pipeline;
mod prompt;
mod tasks;

use clap::Parser;
use pipeline::Settings;
use prompt::TerminalPrompt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tasks::PlaceholderTaskSource;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Opens one GitHub issue per task of a PM issue.
#[derive(Parser, Debug)]
#[command(name = "issue-splitter")]
#[command(about = "Splits a GitHub PM issue into one issue per sub-task")]
struct Args {
    /// URL of the PM issue, e.g. https://github.com/acme/widgets/issues/42.
    pm_issue_url: Option<String>,

    /// Repository (under the PM issue's owner) for tasks that name none.
    default_repo: Option<String>,

    /// Credential file holding the GitHub token.
    #[arg(short, long, env = "ISSUE_SPLITTER_CONFIG", default_value = ".config.json")]
    config: PathBuf,

    /// GitHub API base URL.
    #[arg(long, env = "ISSUE_SPLITTER_API_URL", default_value = github_adapter::DEFAULT_BASE_URL)]
    api_url: String,

    /// Check the token with GET /user and report the rate limit before splitting.
    #[arg(long, env = "ISSUE_SPLITTER_VERIFY_TOKEN")]
    verify_token: bool,

    /// Stop prompting for a token after this many invalid entries.
    #[arg(long, env = "ISSUE_SPLITTER_MAX_TOKEN_ATTEMPTS")]
    max_token_attempts: Option<u32>,

    /// Connect timeout in seconds (transport default when unset).
    #[arg(long, env = "ISSUE_SPLITTER_CONNECT_TIMEOUT")]
    connect_timeout: Option<u64>,
}

impl From<Args> for Settings {
    fn from(args: Args) -> Self {
        Settings {
            pm_issue_url: args.pm_issue_url,
            default_repo: args.default_repo,
            config_path: args.config,
            api_url: args.api_url,
            verify_token: args.verify_token,
            max_token_attempts: args.max_token_attempts,
            connect_timeout: args.connect_timeout.map(Duration::from_secs),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("issue_splitter=info,github_adapter=info"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let settings = Settings::from(Args::parse());

    match pipeline::run(&settings, &mut TerminalPrompt::new(), &PlaceholderTaskSource).await {
        Ok(summary) => {
            for issue in &summary.created {
                println!(
                    "task {} -> {}/{}#{}",
                    issue.ordinal, summary.source.owner, issue.repo, issue.number
                );
            }
            tracing::info!(
                pm_issue = %summary.source.issue_url(),
                created = summary.created.len(),
                "Completed"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Completed with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
