//! Clipboard abstraction.
//!
//! The system clipboard is owned by the desktop, not by the workspace. Writes
//! are attempted once and never retried.

use async_trait::async_trait;

use crate::error::DomainError;

/// A text sink shared with other applications.
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Replace the clipboard contents with `text`.
    async fn write_text(&self, text: &str) -> Result<(), DomainError>;
}
