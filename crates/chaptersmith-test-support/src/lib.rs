//! Shared test fakes and utilities for ChapterSmith.

mod backend;
mod clipboard;

pub use backend::{BackendCall, GenerationMode, ScriptedBackend, filler_words, sample_project};
pub use clipboard::{FailingClipboard, RecordingClipboard};
