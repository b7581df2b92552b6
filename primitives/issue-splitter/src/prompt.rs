//! Interactive token entry.

use dialoguer::Password;
use dialoguer::theme::{ColorfulTheme, SimpleTheme, Theme};
use std::io;

/// Source of a GitHub token typed in by a human.
pub trait TokenPrompt {
    /// Reads one candidate token. Validation happens in the caller.
    fn read_token(&mut self) -> io::Result<String>;
}

/// Hidden-input terminal prompt.
pub struct TerminalPrompt {
    theme: Box<dyn Theme>,
}

impl TerminalPrompt {
    pub fn new() -> Self {
        let colors_enabled = std::env::var("NO_COLOR").is_err()
            && std::env::var("TERM").map_or(true, |term| term != "dumb");

        let theme: Box<dyn Theme> = if colors_enabled {
            Box::new(ColorfulTheme::default())
        } else {
            Box::new(SimpleTheme)
        };

        Self { theme }
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenPrompt for TerminalPrompt {
    fn read_token(&mut self) -> io::Result<String> {
        Password::with_theme(&*self.theme)
            .with_prompt("github token")
            .allow_empty_password(true)
            .interact()
            .map(|token| token.trim().to_string())
            .map_err(|e| io::Error::other(e.to_string()))
    }
}
