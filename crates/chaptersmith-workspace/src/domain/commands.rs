//! Commands sent to the story backend.

use chaptersmith_core::chapter::ChapterPatch;
use chaptersmith_core::project::{NewProject, ProjectId};
use uuid::Uuid;

/// Command to create a project.
#[derive(Debug, Clone)]
pub struct CreateProject {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project to create.
    pub project: NewProject,
}

/// Command to delete a project and its chapters.
#[derive(Debug, Clone)]
pub struct DeleteProject {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project to delete.
    pub project_id: ProjectId,
}

/// Command to fetch or create the chapter scaffold of a project.
#[derive(Debug, Clone)]
pub struct InitializeChapters {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project whose chapters are initialized.
    pub project_id: ProjectId,
}

/// Command to generate one chapter.
#[derive(Debug, Clone)]
pub struct GenerateChapter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project the chapter belongs to.
    pub project_id: ProjectId,
    /// The chapter to generate.
    pub number: u32,
}

/// Command to build the generation prompt of one chapter.
#[derive(Debug, Clone)]
pub struct BuildPrompt {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project the chapter belongs to.
    pub project_id: ProjectId,
    /// The chapter whose prompt is built.
    pub number: u32,
}

/// Command to apply a partial update to one chapter.
#[derive(Debug, Clone)]
pub struct UpdateChapter {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The project the chapter belongs to.
    pub project_id: ProjectId,
    /// The chapter to update.
    pub number: u32,
    /// Fields to change.
    pub patch: ChapterPatch,
}
