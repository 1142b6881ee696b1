//! ChapterSmith shell error types.

use chaptersmith_core::error::DomainError;
use chaptersmith_http::HttpBackendError;
use thiserror::Error;

/// Startup and runtime errors for the shell.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The HTTP backend could not be set up.
    #[error("backend setup error: {0}")]
    Backend(#[from] HttpBackendError),

    /// A workspace operation failed. The shell reports these and keeps going.
    #[error("{0}")]
    Domain(#[from] DomainError),

    /// Reading commands or writing output failed.
    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Whether the shell can report this error and read the next command.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Domain(_))
    }
}
