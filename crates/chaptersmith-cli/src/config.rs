//! Start-up configuration read from the environment.

use std::time::Duration;

use crate::clipboard::ClipboardCommand;
use crate::error::AppError;

/// Base URL of the story server.
pub const BACKEND_URL_VAR: &str = "CHAPTERSMITH_BACKEND_URL";
/// Request timeout in whole seconds.
pub const TIMEOUT_VAR: &str = "CHAPTERSMITH_TIMEOUT_SECS";
/// Optional command line that receives clipboard text on stdin instead of
/// the native clipboard.
pub const CLIPBOARD_VAR: &str = "CHAPTERSMITH_CLIPBOARD";

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Settings for one shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the story server.
    pub backend_url: String,
    /// Per-request timeout. Generation can take minutes.
    pub timeout: Duration,
    /// Copy program overriding the native clipboard.
    pub clipboard: Option<ClipboardCommand>,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let backend_url = lookup(BACKEND_URL_VAR)
            .map(|url| url.trim().trim_end_matches('/').to_owned())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_owned());

        let timeout_secs = match lookup(TIMEOUT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "{TIMEOUT_VAR} must be a positive number of seconds, got {raw:?}"
                    ))
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let clipboard = lookup(CLIPBOARD_VAR)
            .map(|raw| {
                ClipboardCommand::parse(&raw).ok_or_else(|| {
                    AppError::Config(format!("{CLIPBOARD_VAR} must name a program"))
                })
            })
            .transpose()?;

        Ok(Self {
            backend_url,
            timeout: Duration::from_secs(timeout_secs),
            clipboard,
        })
    }
}
