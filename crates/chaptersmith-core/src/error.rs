//! Domain error types.

use thiserror::Error;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Input rejected before any backend call was made.
    #[error("validation error: {0}")]
    Validation(String),

    /// An operation needed an open project and none is open.
    #[error("no project is open")]
    NoOpenProject,

    /// The open project has no chapter with this number.
    #[error("chapter {0} not found")]
    ChapterNotFound(u32),

    /// The chapter's lifecycle does not allow the requested action.
    #[error("chapter {number} cannot {action} while {phase}")]
    InvalidTransition {
        /// The chapter number.
        number: u32,
        /// The lifecycle phase the chapter was in.
        phase: &'static str,
        /// The rejected action.
        action: &'static str,
    },

    /// A generation request for this chapter is already in flight.
    #[error("chapter {0} is already generating")]
    ChapterBusy(u32),

    /// The operation was superseded or its project session was closed.
    #[error("operation cancelled")]
    Cancelled,

    /// The backend answered with a non-success status.
    #[error("backend error ({status}): {message}")]
    Backend {
        /// HTTP-style status code.
        status: u16,
        /// Human-readable message extracted from the response.
        message: String,
    },

    /// The backend could not be reached or its response was unreadable.
    #[error("transport error: {0}")]
    Transport(String),

    /// Writing to the clipboard failed.
    #[error("clipboard error: {0}")]
    Clipboard(String),
}
