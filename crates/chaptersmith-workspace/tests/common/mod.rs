//! Shared helpers for workspace integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use chaptersmith_core::clipboard::Clipboard;
use chaptersmith_core::pov::PovMode;
use chaptersmith_core::project::Project;
use chaptersmith_test_support::{RecordingClipboard, ScriptedBackend, sample_project};
use chaptersmith_workspace::application::workspace::Workspace;

/// A workspace wired to in-memory fakes, plus handles on those fakes.
pub struct Harness {
    pub workspace: Workspace,
    pub backend: Arc<ScriptedBackend>,
    pub clipboard: Arc<RecordingClipboard>,
}

/// Build a workspace whose backend already knows `project`.
pub fn harness_with(project: &Project) -> Harness {
    let backend = Arc::new(ScriptedBackend::new().with_project(project.clone()));
    let clipboard = Arc::new(RecordingClipboard::new());
    let workspace = Workspace::new(backend.clone(), clipboard.clone());
    Harness {
        workspace,
        backend,
        clipboard,
    }
}

/// Build a workspace with a different clipboard implementation.
pub fn harness_with_clipboard(
    project: &Project,
    clipboard: Arc<dyn Clipboard>,
) -> (Workspace, Arc<ScriptedBackend>) {
    let backend = Arc::new(ScriptedBackend::new().with_project(project.clone()));
    let workspace = Workspace::new(backend.clone(), clipboard);
    (workspace, backend)
}

/// Build a workspace and open a sample project of `count` chapters.
pub async fn opened(count: u32, mode: PovMode) -> Harness {
    let project = sample_project("p1", count, mode);
    let harness = harness_with(&project);
    harness.workspace.open(project).await.unwrap();
    harness
}
