//! Chapter records and word-count conformance.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::pov::Pov;

/// Target completeness band for a chapter, in words.
pub const TARGET_WORDS: RangeInclusive<usize> = 1400..=1800;

/// Server-side status of a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStatus {
    /// No content yet.
    #[default]
    Empty,
    /// Saved from a manual edit.
    Draft,
    /// Written by the generation backend.
    Generated,
}

impl ChapterStatus {
    /// Returns the wire name of this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Draft => "draft",
            Self::Generated => "generated",
        }
    }
}

impl fmt::Display for ChapterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chapter record as confirmed by the backend.
///
/// The word count is not a field: it is always derived from `content`, and
/// any `words` value sent by the server is ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// 1-based position within the project.
    pub number: u32,
    /// Chapter title.
    #[serde(default)]
    pub title: String,
    /// Plain-text body.
    #[serde(default)]
    pub content: String,
    /// Server-side status.
    #[serde(default)]
    pub status: ChapterStatus,
    /// Manually chosen POV, if any.
    #[serde(default)]
    pub pov: Option<Pov>,
}

impl Chapter {
    /// Creates the empty scaffold for a chapter number.
    #[must_use]
    pub fn empty(number: u32) -> Self {
        Self {
            number,
            title: format!("Chapter {number}"),
            content: String::new(),
            status: ChapterStatus::Empty,
            pov: None,
        }
    }

    /// Number of words in the content.
    #[must_use]
    pub fn words(&self) -> usize {
        word_count(&self.content)
    }

    /// Whether the word count lies inside [`TARGET_WORDS`].
    #[must_use]
    pub fn is_in_range(&self) -> bool {
        is_in_range(self.words())
    }

    /// Markdown rendering used by the copy action.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        format!("# {}\n\n{}", self.title, self.content)
    }
}

/// Counts whitespace-separated words.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Whether `words` lies inside [`TARGET_WORDS`]; both bounds are inclusive.
#[must_use]
pub fn is_in_range(words: usize) -> bool {
    TARGET_WORDS.contains(&words)
}

/// Partial chapter update. Unset fields are left unchanged by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterPatch {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// New status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ChapterStatus>,
    /// New POV override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pov: Option<Pov>,
}

impl ChapterPatch {
    /// Patch produced by saving the editor: title, content and `draft` status.
    #[must_use]
    pub fn save_draft(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
            status: Some(ChapterStatus::Draft),
            pov: None,
        }
    }

    /// Patch that only sets the POV override.
    #[must_use]
    pub fn pov(pov: Pov) -> Self {
        Self {
            pov: Some(pov),
            ..Self::default()
        }
    }
}
