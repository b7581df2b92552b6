//! Credential file handling.
//!
//! The token lives in a small JSON file (`.config.json` by default):
//!
//! ```json
//! {
//!   "githubToken": "<40 lowercase alphanumeric characters>"
//! }
//! ```
//!
//! When the file is missing or not readable and writable, the user is
//! prompted until a well-formed token is entered, and the file is written.

use crate::prompt::TokenPrompt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

/// Required token length.
pub const TOKEN_LENGTH: usize = 40;

#[allow(clippy::expect_used)]
static TOKEN_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+$").expect("token pattern is valid"));

/// Why a token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token not found")]
    Missing,

    #[error("Invalid token. Must be of length 40, but found length {0}")]
    WrongLength(usize),

    #[error("Invalid characters found in the token")]
    InvalidCharacters,
}

/// A validated GitHub token.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Token(****)")
    }
}

/// Checks the token's shape: exactly 40 characters from `[a-z0-9]`.
pub fn validate_token(token: &str) -> Result<Token, TokenError> {
    if token.is_empty() {
        return Err(TokenError::Missing);
    }
    let length = token.chars().count();
    if length != TOKEN_LENGTH {
        return Err(TokenError::WrongLength(length));
    }
    if !TOKEN_CHARS.is_match(token) {
        return Err(TokenError::InvalidCharacters);
    }
    Ok(Token(token.to_string()))
}

/// Credential bootstrap failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error writing token to file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("the content of {} file is not a valid JSON", .path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("token in {} is invalid: {source}", .path.display())]
    InvalidToken {
        path: PathBuf,
        #[source]
        source: TokenError,
    },

    #[error("failed to read the github token: {0}")]
    Prompt(#[source] io::Error),

    #[error("no valid github token entered after {0} attempt(s)")]
    TooManyAttempts(u32),
}

/// On-disk layout of the credential file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(rename = "githubToken", default)]
    github_token: Option<String>,
}

/// The credential file at a given path.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the file exists and can be opened for both reading and writing.
    pub fn is_present(&self) -> bool {
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .is_ok()
    }

    /// Reads and validates the stored token.
    pub fn load(&self) -> Result<Token, ConfigError> {
        let data = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        let file: CredentialFile =
            serde_json::from_str(&data).map_err(|source| ConfigError::InvalidJson {
                path: self.path.clone(),
                source,
            })?;

        validate_token(file.github_token.as_deref().unwrap_or_default()).map_err(|source| {
            ConfigError::InvalidToken {
                path: self.path.clone(),
                source,
            }
        })
    }

    /// Writes the token as pretty-printed JSON. On Unix the file is created owner-only.
    pub fn save(&self, token: &Token) -> Result<(), ConfigError> {
        let file = CredentialFile {
            github_token: Some(token.as_str().to_string()),
        };
        let mut contents = serde_json::to_string_pretty(&file).map_err(|source| {
            ConfigError::InvalidJson {
                path: self.path.clone(),
                source,
            }
        })?;
        contents.push('\n');

        let write_err = |source: io::Error| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut handle = options.open(&self.path).map_err(write_err)?;
        handle.write_all(contents.as_bytes()).map_err(write_err)?;
        Ok(())
    }
}

/// Prompts until a well-formed token is entered.
///
/// Invalid entries are logged and the prompt repeats, up to `max_attempts`
/// when a bound is given.
pub fn prompt_for_token(
    prompt: &mut dyn TokenPrompt,
    max_attempts: Option<u32>,
) -> Result<Token, ConfigError> {
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        tracing::info!("Please enter your github token");
        let candidate = prompt.read_token().map_err(ConfigError::Prompt)?;

        match validate_token(&candidate) {
            Ok(token) => return Ok(token),
            Err(reason) => {
                tracing::warn!("{reason}");
                if max_attempts.is_some_and(|max| attempts >= max) {
                    return Err(ConfigError::TooManyAttempts(attempts));
                }
            }
        }
    }
}

/// Makes sure a usable credential file exists, then loads the token from it.
pub fn bootstrap(
    store: &CredentialStore,
    prompt: &mut dyn TokenPrompt,
    max_attempts: Option<u32>,
) -> Result<Token, ConfigError> {
    tracing::debug!(path = %store.path().display(), "Inside check_config_file");

    if store.is_present() {
        tracing::debug!("Inside create_config_file skipped");
    } else {
        tracing::warn!("{} file not found", store.path().display());
        tracing::debug!("Inside create_config_file");

        let token = prompt_for_token(prompt, max_attempts)?;
        tracing::debug!("Saving token to file {} ...", store.path().display());
        store.save(&token)?;
        tracing::info!("token saved in {}!", store.path().display());
    }

    tracing::debug!("Inside check_token");
    store.load()
}
