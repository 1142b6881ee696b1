//! Command handlers for project setup and housekeeping.

use chaptersmith_core::backend::StoryBackend;
use chaptersmith_core::error::DomainError;
use chaptersmith_core::project::Project;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::commands::{CreateProject, DeleteProject};

/// Handles the `CreateProject` command: validates the request locally, then
/// asks the backend to create the project.
///
/// # Errors
///
/// Returns `DomainError::Validation` without calling the backend if the
/// request is incomplete, or the backend's error if creation fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id))]
pub async fn handle_create_project(
    command: &CreateProject,
    backend: &dyn StoryBackend,
) -> Result<Project, DomainError> {
    command.project.validate()?;

    let project = backend
        .create_project(command.correlation_id, &command.project)
        .await?;

    info!(project_id = %project.id, chapters = project.chapter_count, "project created");
    Ok(project)
}

/// Lists every project known to the backend.
///
/// # Errors
///
/// Returns the backend's error if the listing fails.
#[instrument(skip_all, fields(correlation_id = %correlation_id))]
pub async fn handle_list_projects(
    correlation_id: Uuid,
    backend: &dyn StoryBackend,
) -> Result<Vec<Project>, DomainError> {
    backend.list_projects(correlation_id).await
}

/// Handles the `DeleteProject` command.
///
/// # Errors
///
/// Returns the backend's error if deletion fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, project_id = %command.project_id))]
pub async fn handle_delete_project(
    command: &DeleteProject,
    backend: &dyn StoryBackend,
) -> Result<(), DomainError> {
    backend
        .delete_project(command.correlation_id, &command.project_id)
        .await?;

    info!("project deleted");
    Ok(())
}
