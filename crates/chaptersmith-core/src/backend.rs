//! Story backend abstraction.
//!
//! The backend owns persistence and text generation. Everything the
//! workspace knows about a project was confirmed by one of these calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chapter::{Chapter, ChapterPatch};
use crate::error::DomainError;
use crate::project::{NewProject, Project, ProjectId};

/// Marker for the prompt-only response mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptOnlyMode {
    /// No generation model is configured on the server.
    PromptOnly,
}

/// Response of the generate endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Generation {
    /// The server has no model and handed back the prompt instead.
    PromptOnly {
        /// Always `prompt_only`.
        mode: PromptOnlyMode,
        /// Prompt to run through an external model.
        prompt: String,
    },
    /// The server generated the chapter.
    Content(Chapter),
}

impl Generation {
    /// Builds a prompt-only response.
    #[must_use]
    pub fn prompt_only(prompt: impl Into<String>) -> Self {
        Self::PromptOnly {
            mode: PromptOnlyMode::PromptOnly,
            prompt: prompt.into(),
        }
    }
}

/// Response of the explicit prompt endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptResponse {
    /// The assembled generation prompt.
    pub prompt: String,
}

/// Request/response contract of the story backend.
///
/// Every method takes the `correlation_id` of the command that issued it so
/// implementations can tag their traffic.
#[async_trait]
pub trait StoryBackend: Send + Sync {
    /// Create a project.
    async fn create_project(
        &self,
        correlation_id: Uuid,
        project: &NewProject,
    ) -> Result<Project, DomainError>;

    /// List all projects.
    async fn list_projects(&self, correlation_id: Uuid) -> Result<Vec<Project>, DomainError>;

    /// Delete a project and its chapters.
    async fn delete_project(
        &self,
        correlation_id: Uuid,
        project_id: &ProjectId,
    ) -> Result<(), DomainError>;

    /// Create the chapter scaffold, or return the current chapters if it
    /// already exists.
    async fn initialize_chapters(
        &self,
        correlation_id: Uuid,
        project_id: &ProjectId,
    ) -> Result<Vec<Chapter>, DomainError>;

    /// Generate one chapter.
    async fn generate_chapter(
        &self,
        correlation_id: Uuid,
        project_id: &ProjectId,
        number: u32,
    ) -> Result<Generation, DomainError>;

    /// Build the generation prompt for one chapter without generating.
    async fn build_prompt(
        &self,
        correlation_id: Uuid,
        project_id: &ProjectId,
        number: u32,
    ) -> Result<PromptResponse, DomainError>;

    /// Apply a partial update to one chapter.
    async fn update_chapter(
        &self,
        correlation_id: Uuid,
        project_id: &ProjectId,
        number: u32,
        patch: &ChapterPatch,
    ) -> Result<Chapter, DomainError>;
}
