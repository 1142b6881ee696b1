//! ChapterSmith — HTTP story backend.
//!
//! A `reqwest` implementation of `StoryBackend` for the JSON API served by
//! the story server.

pub mod client;
pub mod error;

pub use client::HttpBackend;
pub use error::HttpBackendError;
