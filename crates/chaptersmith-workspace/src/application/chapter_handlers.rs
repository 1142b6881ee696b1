//! Command handlers for chapter scaffolding, prompts and partial updates.
//!
//! These functions only talk to the backend. Applying their results to the
//! local store is the workspace's job, because only it knows whether the
//! response is still wanted.

use chaptersmith_core::backend::StoryBackend;
use chaptersmith_core::chapter::Chapter;
use chaptersmith_core::error::DomainError;
use tracing::{info, instrument};

use crate::domain::commands::{BuildPrompt, InitializeChapters, UpdateChapter};

/// Handles the `InitializeChapters` command.
///
/// # Errors
///
/// Returns the backend's error if scaffolding fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, project_id = %command.project_id))]
pub async fn handle_initialize_chapters(
    command: &InitializeChapters,
    backend: &dyn StoryBackend,
) -> Result<Vec<Chapter>, DomainError> {
    let chapters = backend
        .initialize_chapters(command.correlation_id, &command.project_id)
        .await?;

    info!(chapters = chapters.len(), "chapters initialized");
    Ok(chapters)
}

/// Handles the `UpdateChapter` command.
///
/// # Errors
///
/// Returns the backend's error if the update fails, or
/// `DomainError::Transport` if the backend answers with a different chapter.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, chapter = command.number))]
pub async fn handle_update_chapter(
    command: &UpdateChapter,
    backend: &dyn StoryBackend,
) -> Result<Chapter, DomainError> {
    let chapter = backend
        .update_chapter(
            command.correlation_id,
            &command.project_id,
            command.number,
            &command.patch,
        )
        .await?;

    if chapter.number != command.number {
        return Err(DomainError::Transport(format!(
            "update of chapter {} answered with chapter {}",
            command.number, chapter.number
        )));
    }

    info!(status = %chapter.status, "chapter updated");
    Ok(chapter)
}

/// Handles the `BuildPrompt` command.
///
/// # Errors
///
/// Returns the backend's error if the prompt cannot be built.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, chapter = command.number))]
pub async fn handle_build_prompt(
    command: &BuildPrompt,
    backend: &dyn StoryBackend,
) -> Result<String, DomainError> {
    let response = backend
        .build_prompt(command.correlation_id, &command.project_id, command.number)
        .await?;
    Ok(response.prompt)
}
