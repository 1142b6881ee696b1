//! Read-only views of the open project.

use chaptersmith_core::chapter::{Chapter, ChapterStatus};
use chaptersmith_core::pov::Pov;
use chaptersmith_core::project::Project;
use serde::Serialize;

use crate::domain::lifecycle::ChapterPhase;

/// Everything a display needs about one chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterView {
    /// Chapter number.
    pub number: u32,
    /// Chapter title.
    pub title: String,
    /// Chapter body.
    pub content: String,
    /// Words in the body.
    pub words: usize,
    /// Whether `words` is inside the target band. Out-of-range chapters are
    /// flagged, never rejected.
    pub in_range: bool,
    /// Server-side status.
    pub status: ChapterStatus,
    /// Client-side lifecycle phase.
    pub phase: ChapterPhase,
    /// Effective POV.
    pub pov: Pov,
    /// Manually chosen POV, if any.
    pub pov_override: Option<Pov>,
}

impl ChapterView {
    /// Builds the view of `chapter` within `project`.
    #[must_use]
    pub fn new(project: &Project, chapter: &Chapter, phase: ChapterPhase) -> Self {
        let words = chapter.words();
        Self {
            number: chapter.number,
            title: chapter.title.clone(),
            content: chapter.content.clone(),
            words,
            in_range: chaptersmith_core::chapter::is_in_range(words),
            status: chapter.status,
            phase,
            pov: project.pov_for(chapter.number, chapter.pov),
            pov_override: chapter.pov,
        }
    }
}

/// The editor's starting contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditBuffer {
    /// Chapter number.
    pub number: u32,
    /// Title as last saved.
    pub title: String,
    /// Body as last saved.
    pub content: String,
}
