//! Integration tests for the workspace controller.

mod common;

use std::sync::Arc;

use chaptersmith_core::chapter::{ChapterPatch, ChapterStatus};
use chaptersmith_core::error::DomainError;
use chaptersmith_core::pov::{Pov, PovMode};
use chaptersmith_core::project::{NewProject, ProjectId};
use chaptersmith_test_support::{
    BackendCall, FailingClipboard, GenerationMode, filler_words, sample_project,
};
use chaptersmith_workspace::application::generation::{ClipboardStatus, GenerationOutcome};
use chaptersmith_workspace::domain::lifecycle::ChapterPhase;

fn generate_calls(calls: &[BackendCall]) -> usize {
    calls
        .iter()
        .filter(|call| matches!(call, BackendCall::GenerateChapter(..)))
        .count()
}

#[tokio::test]
async fn test_dual_project_initializes_alternating_empty_chapters() {
    // Arrange
    let seed = sample_project("seed", 1, PovMode::Female);
    let harness = common::harness_with(&seed);
    let project = harness
        .workspace
        .create_project(NewProject::new("Heist", "A heist goes wrong.", 3, PovMode::Dual))
        .await
        .unwrap();

    // Act
    let chapters = harness.workspace.open(project).await.unwrap();

    // Assert
    let numbers: Vec<u32> = chapters.iter().map(|view| view.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert!(chapters.iter().all(|view| view.status == ChapterStatus::Empty));
    assert!(chapters.iter().all(|view| view.phase == ChapterPhase::Empty));
    let povs: Vec<Pov> = chapters.iter().map(|view| view.pov).collect();
    assert_eq!(povs, vec![Pov::Female, Pov::Male, Pov::Female]);
}

#[tokio::test]
async fn test_generate_with_content_marks_chapter_generated_in_range() {
    // Arrange
    let harness = common::opened(3, PovMode::Dual).await;

    // Act
    let outcome = harness.workspace.generate(2).await.unwrap();

    // Assert
    match outcome {
        GenerationOutcome::Generated { chapter, pov } => {
            assert_eq!(chapter.number, 2);
            assert_eq!(chapter.words(), 1600);
            assert_eq!(pov, Pov::Male);
        }
        other => panic!("expected Generated, got {other:?}"),
    }
    let view = harness.workspace.chapter(2).unwrap();
    assert_eq!(view.status, ChapterStatus::Generated);
    assert_eq!(view.phase, ChapterPhase::Generated);
    assert!(view.in_range);
    assert_eq!(harness.workspace.chapter(1).unwrap().status, ChapterStatus::Empty);
}

#[tokio::test]
async fn test_generate_without_model_copies_prompt_then_edit_saves_draft() {
    // Arrange
    let harness = common::opened(3, PovMode::Female).await;
    harness.backend.set_generation(GenerationMode::PromptOnly);

    // Act
    let outcome = harness.workspace.generate(1).await.unwrap();

    // Assert: nothing persisted, prompt on the clipboard
    let GenerationOutcome::PromptOnly { prompt, clipboard } = outcome else {
        panic!("expected PromptOnly");
    };
    assert_eq!(clipboard, ClipboardStatus::Copied);
    assert_eq!(harness.clipboard.contents(), Some(prompt));
    let view = harness.workspace.chapter(1).unwrap();
    assert_eq!(view.status, ChapterStatus::Empty);
    assert_eq!(view.phase, ChapterPhase::PromptPending);
    assert!(view.content.is_empty());

    // Act: paste the model's output through the editor
    harness.workspace.begin_edit(1).unwrap();
    let saved = harness
        .workspace
        .save_edit(1, "Opening", filler_words(1500))
        .await
        .unwrap();

    // Assert
    assert_eq!(saved.status, ChapterStatus::Draft);
    assert_eq!(saved.phase, ChapterPhase::Draft);
    assert_eq!(saved.title, "Opening");
    assert!(saved.in_range);
}

#[tokio::test]
async fn test_apply_update_changes_only_target_chapter() {
    // Arrange
    let harness = common::opened(3, PovMode::Female).await;
    let before = harness.workspace.chapters().unwrap();

    // Act
    let updated = harness
        .workspace
        .apply_update(
            3,
            ChapterPatch {
                title: Some("X".to_owned()),
                ..ChapterPatch::default()
            },
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(updated.title, "X");
    let after = harness.workspace.chapters().unwrap();
    assert_eq!(after[0], before[0]);
    assert_eq!(after[1], before[1]);
    assert_eq!(after[2].title, "X");
    assert_eq!(after[2].content, before[2].content);
}

#[tokio::test]
async fn test_generate_while_generating_is_rejected_without_second_dispatch() {
    // Arrange
    let harness = common::opened(3, PovMode::Female).await;
    let gate = harness.backend.hold(2);

    // Act
    let (first, second, ()) = tokio::join!(
        harness.workspace.generate(2),
        async { harness.workspace.generate(2).await },
        async { gate.notify_one() },
    );

    // Assert
    assert!(matches!(first, Ok(GenerationOutcome::Generated { .. })));
    assert!(matches!(second, Err(DomainError::ChapterBusy(2))));
    assert_eq!(generate_calls(&harness.backend.calls()), 1);
    assert_eq!(
        harness.workspace.chapter(2).unwrap().phase,
        ChapterPhase::Generated
    );
}

#[tokio::test]
async fn test_generating_chapters_do_not_block_each_other() {
    let harness = common::opened(3, PovMode::Dual).await;
    let gate = harness.backend.hold(1);

    let (one, two, ()) = tokio::join!(
        harness.workspace.generate(1),
        harness.workspace.generate(2),
        async { gate.notify_one() },
    );

    assert!(one.is_ok());
    assert!(two.is_ok());
    assert_eq!(generate_calls(&harness.backend.calls()), 2);
}

#[tokio::test]
async fn test_pov_override_waits_for_in_flight_generation() {
    // Arrange
    let harness = common::opened(3, PovMode::Female).await;
    let gate = harness.backend.hold(1);

    // Act
    let (generation, pov, phase_while_generating) = tokio::join!(
        harness.workspace.generate(1),
        harness.workspace.set_pov_override(1, Pov::Male),
        async {
            let phase = harness.workspace.chapter(1).unwrap().phase;
            gate.notify_one();
            phase
        },
    );

    // Assert
    assert!(matches!(pov, Err(DomainError::ChapterBusy(1))));
    assert_eq!(phase_while_generating, ChapterPhase::Generating);
    assert!(matches!(generation, Ok(GenerationOutcome::Generated { .. })));
    let view = harness.workspace.chapter(1).unwrap();
    assert_eq!(view.phase, ChapterPhase::Generated);
    assert_eq!(view.words, 1600);

    // Once settled the override applies without touching the content.
    let view = harness.workspace.set_pov_override(1, Pov::Male).await.unwrap();
    assert_eq!(view.pov, Pov::Male);
    assert_eq!(view.pov_override, Some(Pov::Male));
    assert_eq!(view.phase, ChapterPhase::Generated);
    assert_eq!(view.words, 1600);
}

#[tokio::test]
async fn test_newer_update_drops_in_flight_save_and_keeps_editor_open() {
    // Arrange
    let harness = common::opened(3, PovMode::Female).await;
    harness.workspace.generate(2).await.unwrap();
    harness.workspace.begin_edit(2).unwrap();
    let gate = harness.backend.hold(2);

    // Act
    let (save, pov, ()) = tokio::join!(
        harness.workspace.save_edit(2, "Saved title", "saved body"),
        harness.workspace.set_pov_override(2, Pov::Male),
        async { gate.notify_one() },
    );

    // Assert
    assert!(matches!(save, Err(DomainError::Cancelled)));
    let view = pov.unwrap();
    assert_eq!(view.pov_override, Some(Pov::Male));
    assert_eq!(view.phase, ChapterPhase::Editing);
    let view = harness.workspace.chapter(2).unwrap();
    assert_eq!(view.phase, ChapterPhase::Editing);
    assert_eq!(view.title, "Chapter 2: Generated");
    let updates = harness
        .backend
        .calls()
        .iter()
        .filter(|call| matches!(call, BackendCall::UpdateChapter(..)))
        .count();
    assert_eq!(updates, 2);

    // The editor is still open, so the save can be repeated.
    let saved = harness
        .workspace
        .save_edit(2, "Saved title", "saved body")
        .await
        .unwrap();
    assert_eq!(saved.phase, ChapterPhase::Draft);
    assert_eq!(saved.pov_override, Some(Pov::Male));
}

#[tokio::test]
async fn test_late_reload_keeps_update_confirmed_meanwhile() {
    // Arrange
    let harness = common::opened(3, PovMode::Female).await;
    let gate = harness.backend.hold_initialize();

    // Act
    let (reloaded, updated) = tokio::join!(harness.workspace.initialize(), async {
        let updated = harness
            .workspace
            .apply_update(
                2,
                ChapterPatch {
                    title: Some("NEW".to_owned()),
                    ..ChapterPatch::default()
                },
            )
            .await;
        gate.notify_one();
        updated
    });

    // Assert
    assert_eq!(updated.unwrap().title, "NEW");
    let reloaded = reloaded.unwrap();
    assert_eq!(reloaded[1].title, "NEW");
    assert_eq!(harness.workspace.chapter(2).unwrap().title, "NEW");
    assert_eq!(
        harness.backend.stored_chapters(&ProjectId::from("p1"))[1].title,
        "NEW"
    );
    assert_eq!(reloaded[0].title, "Chapter 1");
}

#[tokio::test]
async fn test_close_cancels_in_flight_generation() {
    // Arrange
    let harness = common::opened(3, PovMode::Female).await;
    let gate = harness.backend.hold(2);

    // Act
    let (generation, ()) = tokio::join!(harness.workspace.generate(2), async {
        harness.workspace.close();
        gate.notify_one();
    });

    // Assert
    assert!(matches!(generation, Err(DomainError::Cancelled)));
    assert!(harness.workspace.project().is_none());
    assert!(matches!(
        harness.workspace.chapters(),
        Err(DomainError::NoOpenProject)
    ));
}

#[tokio::test]
async fn test_generation_failure_restores_previous_state() {
    // Arrange
    let harness = common::opened(3, PovMode::Female).await;
    harness.backend.fail_with(500, "model crashed");

    // Act
    let result = harness.workspace.generate(1).await;

    // Assert
    match result {
        Err(DomainError::Backend { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "model crashed");
        }
        other => panic!("expected Backend, got {other:?}"),
    }
    let view = harness.workspace.chapter(1).unwrap();
    assert_eq!(view.phase, ChapterPhase::Empty);
    assert_eq!(view.status, ChapterStatus::Empty);

    // A retry after recovery goes through.
    harness.backend.clear_failure();
    assert!(harness.workspace.generate(1).await.is_ok());
}

#[tokio::test]
async fn test_failed_reinitialize_keeps_chapter_list() {
    // Arrange
    let harness = common::opened(3, PovMode::Female).await;
    harness.workspace.generate(1).await.unwrap();
    harness.backend.fail_with(502, "bad gateway");

    // Act
    let result = harness.workspace.initialize().await;

    // Assert
    assert!(matches!(result, Err(DomainError::Backend { status: 502, .. })));
    let chapters = harness.workspace.chapters().unwrap();
    assert_eq!(chapters.len(), 3);
    assert_eq!(chapters[0].status, ChapterStatus::Generated);
}

#[tokio::test]
async fn test_failed_open_leaves_project_open_without_chapters() {
    // Arrange
    let project = sample_project("p1", 3, PovMode::Female);
    let harness = common::harness_with(&project);
    harness.backend.fail_with(503, "service unavailable");

    // Act
    let result = harness.workspace.open(project.clone()).await;

    // Assert
    assert!(result.is_err());
    assert_eq!(harness.workspace.project(), Some(project));
    assert!(harness.workspace.chapters().unwrap().is_empty());

    // Retry succeeds once the backend is back.
    harness.backend.clear_failure();
    assert_eq!(harness.workspace.initialize().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_clipboard_failure_never_touches_chapter_state() {
    // Arrange
    let project = sample_project("p1", 3, PovMode::Female);
    let (workspace, backend) = common::harness_with_clipboard(&project, Arc::new(FailingClipboard));
    workspace.open(project).await.unwrap();
    backend.set_generation(GenerationMode::PromptOnly);

    // Act
    let outcome = workspace.generate(1).await.unwrap();
    let copy = workspace.copy_chapter(2).await;

    // Assert
    let GenerationOutcome::PromptOnly { prompt, clipboard } = outcome else {
        panic!("expected PromptOnly");
    };
    assert!(!prompt.is_empty());
    assert!(matches!(clipboard, ClipboardStatus::Failed(_)));
    assert!(matches!(copy, Err(DomainError::Clipboard(_))));
    assert_eq!(workspace.chapter(1).unwrap().status, ChapterStatus::Empty);
    assert_eq!(workspace.chapter(2).unwrap().phase, ChapterPhase::Empty);
}

#[tokio::test]
async fn test_copy_chapter_writes_markdown() {
    let harness = common::opened(3, PovMode::Female).await;
    harness.workspace.generate(3).await.unwrap();

    harness.workspace.copy_chapter(3).await.unwrap();

    let copied = harness.clipboard.contents().unwrap();
    assert!(copied.starts_with("# Chapter 3: Generated\n\n"));
}

#[tokio::test]
async fn test_delete_open_project_closes_workspace() {
    // Arrange
    let harness = common::opened(3, PovMode::Female).await;
    let project_id = harness.workspace.project().unwrap().id;

    // Act
    harness.workspace.delete_project(&project_id).await.unwrap();

    // Assert
    assert!(harness.workspace.project().is_none());
    assert!(harness.workspace.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_delete_keeps_project_open() {
    let harness = common::opened(3, PovMode::Female).await;
    let project_id = harness.workspace.project().unwrap().id;
    harness.backend.fail_with(500, "locked");

    let result = harness.workspace.delete_project(&project_id).await;

    assert!(result.is_err());
    assert!(harness.workspace.project().is_some());
}

#[tokio::test]
async fn test_edit_rules() {
    // Arrange
    let harness = common::opened(3, PovMode::Female).await;
    harness.workspace.generate(2).await.unwrap();

    // Act / Assert: an empty chapter cannot be edited
    assert!(matches!(
        harness.workspace.begin_edit(1),
        Err(DomainError::InvalidTransition { number: 1, .. })
    ));

    // Saving without opening the editor is rejected
    assert!(matches!(
        harness.workspace.save_edit(2, "t", "c").await,
        Err(DomainError::InvalidTransition { number: 2, .. })
    ));

    // Generating while editing is rejected
    let buffer = harness.workspace.begin_edit(2).unwrap();
    assert_eq!(buffer.title, "Chapter 2: Generated");
    assert!(matches!(
        harness.workspace.generate(2).await,
        Err(DomainError::InvalidTransition { number: 2, .. })
    ));

    // Cancelling restores the generated record and phase
    let view = harness.workspace.cancel_edit(2).unwrap();
    assert_eq!(view.phase, ChapterPhase::Generated);
    assert_eq!(view.title, buffer.title);
    assert_eq!(view.content, buffer.content);
}

#[tokio::test]
async fn test_failed_save_keeps_editor_open() {
    // Arrange
    let harness = common::opened(3, PovMode::Female).await;
    harness.workspace.generate(1).await.unwrap();
    harness.workspace.begin_edit(1).unwrap();
    harness.backend.fail_with(500, "disk full");

    // Act
    let result = harness.workspace.save_edit(1, "New", "Body").await;

    // Assert
    assert!(result.is_err());
    let view = harness.workspace.chapter(1).unwrap();
    assert_eq!(view.phase, ChapterPhase::Editing);
    assert_eq!(view.title, "Chapter 1: Generated");
}

#[tokio::test]
async fn test_explicit_prompt_marks_empty_chapter_pending() {
    // Arrange
    let harness = common::opened(3, PovMode::Female).await;

    // Act
    let outcome = harness.workspace.build_prompt(2).await.unwrap();

    // Assert
    assert_eq!(outcome.clipboard, ClipboardStatus::Copied);
    assert_eq!(harness.clipboard.contents(), Some(outcome.prompt));
    assert_eq!(
        harness.workspace.chapter(2).unwrap().phase,
        ChapterPhase::PromptPending
    );
    assert_eq!(generate_calls(&harness.backend.calls()), 0);
}

#[tokio::test]
async fn test_actions_require_open_project() {
    let project = sample_project("p1", 3, PovMode::Female);
    let harness = common::harness_with(&project);

    assert!(matches!(
        harness.workspace.generate(1).await,
        Err(DomainError::NoOpenProject)
    ));
    assert!(matches!(
        harness.workspace.begin_edit(1),
        Err(DomainError::NoOpenProject)
    ));
}

#[tokio::test]
async fn test_unknown_chapter_is_reported() {
    let harness = common::opened(3, PovMode::Female).await;

    let result = harness.workspace.generate(9).await;

    assert!(matches!(result, Err(DomainError::ChapterNotFound(9))));
    assert_eq!(generate_calls(&harness.backend.calls()), 0);
}

#[tokio::test]
async fn test_create_project_does_not_switch_open_project() {
    let harness = common::opened(3, PovMode::Female).await;

    let created = harness
        .workspace
        .create_project(NewProject::new("Other", "Another outline.", 4, PovMode::Male))
        .await
        .unwrap();

    assert_ne!(harness.workspace.project().unwrap().id, created.id);
    assert_eq!(created.default_pov, Some(Pov::Male));
}
