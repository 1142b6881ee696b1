//! Test clipboards — fake `Clipboard` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chaptersmith_core::clipboard::Clipboard;
use chaptersmith_core::error::DomainError;

/// A clipboard that keeps every write in memory.
#[derive(Debug, Default)]
pub struct RecordingClipboard {
    writes: Mutex<Vec<String>>,
}

impl RecordingClipboard {
    /// Create an empty recording clipboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every text written so far, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    /// Returns the current clipboard contents.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn contents(&self) -> Option<String> {
        self.writes.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Clipboard for RecordingClipboard {
    async fn write_text(&self, text: &str) -> Result<(), DomainError> {
        self.writes.lock().unwrap().push(text.to_owned());
        Ok(())
    }
}

/// A clipboard that rejects every write. Useful for checking that clipboard
/// failures never touch chapter state.
#[derive(Debug)]
pub struct FailingClipboard;

#[async_trait]
impl Clipboard for FailingClipboard {
    async fn write_text(&self, _text: &str) -> Result<(), DomainError> {
        Err(DomainError::Clipboard("clipboard unavailable".into()))
    }
}
