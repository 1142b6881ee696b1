//! Workspace controller.
//!
//! Services user actions on one open project at a time. State changes only
//! after the backend confirms them, and every chapter mutation holds a ticket
//! from the session's in-flight registry so responses that lost the race are
//! dropped instead of applied.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chaptersmith_core::backend::StoryBackend;
use chaptersmith_core::chapter::ChapterPatch;
use chaptersmith_core::clipboard::Clipboard;
use chaptersmith_core::error::DomainError;
use chaptersmith_core::pov::Pov;
use chaptersmith_core::project::{NewProject, Project, ProjectId};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::chapter_handlers::{
    handle_build_prompt, handle_initialize_chapters, handle_update_chapter,
};
use super::generation::{
    self, ClipboardStatus, GenerationOutcome, Reconciled, handle_generate_chapter,
};
use super::in_flight::{InFlightRegistry, OperationKind};
use super::project_handlers::{handle_create_project, handle_delete_project, handle_list_projects};
use super::views::{ChapterView, EditBuffer};
use crate::domain::commands::{
    BuildPrompt, CreateProject, DeleteProject, GenerateChapter, InitializeChapters, UpdateChapter,
};
use crate::domain::lifecycle::{ChapterPhase, LifecycleEvent};
use crate::domain::store::ChapterStore;

/// Result of the explicit prompt path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOutcome {
    /// The generation prompt for the chapter.
    pub prompt: String,
    /// Whether the prompt reached the clipboard.
    pub clipboard: ClipboardStatus,
}

#[derive(Debug)]
struct Session {
    epoch: u64,
    project: Project,
    store: ChapterStore,
    in_flight: InFlightRegistry,
    cancel: CancellationToken,
}

impl Session {
    fn views(&self) -> Vec<ChapterView> {
        self.store
            .iter()
            .map(|(chapter, phase)| ChapterView::new(&self.project, chapter, phase))
            .collect()
    }

    fn view(&self, number: u32) -> Result<ChapterView, DomainError> {
        let chapter = self.store.get(number)?;
        let phase = self.store.phase(number)?;
        Ok(ChapterView::new(&self.project, chapter, phase))
    }
}

#[derive(Debug, Default)]
struct State {
    session: Option<Session>,
    next_epoch: u64,
}

/// The chapter workspace.
pub struct Workspace {
    backend: Arc<dyn StoryBackend>,
    clipboard: Arc<dyn Clipboard>,
    state: Mutex<State>,
}

impl Workspace {
    /// Creates a workspace with no open project.
    #[must_use]
    pub fn new(backend: Arc<dyn StoryBackend>, clipboard: Arc<dyn Clipboard>) -> Self {
        Self {
            backend,
            clipboard,
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_session<T>(
        &self,
        f: impl FnOnce(&mut Session) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let mut state = self.state();
        let session = state.session.as_mut().ok_or(DomainError::NoOpenProject)?;
        f(session)
    }

    /// Runs `f` only if the session that issued a request is still open.
    fn with_epoch<T>(
        &self,
        epoch: u64,
        f: impl FnOnce(&mut Session) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let mut state = self.state();
        match state.session.as_mut() {
            Some(session) if session.epoch == epoch => f(session),
            _ => {
                warn!(epoch, "dropping response for a closed session");
                Err(DomainError::Cancelled)
            }
        }
    }

    /// Creates a project. The workspace stays on its current project.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an incomplete request, or the
    /// backend's error.
    pub async fn create_project(&self, project: NewProject) -> Result<Project, DomainError> {
        let command = CreateProject {
            correlation_id: Uuid::new_v4(),
            project,
        };
        handle_create_project(&command, self.backend.as_ref()).await
    }

    /// Lists every project known to the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend's error.
    pub async fn list_projects(&self) -> Result<Vec<Project>, DomainError> {
        handle_list_projects(Uuid::new_v4(), self.backend.as_ref()).await
    }

    /// Deletes a project; closes it afterwards if it is the open one.
    ///
    /// # Errors
    ///
    /// Returns the backend's error. The open project stays open on failure.
    pub async fn delete_project(&self, project_id: &ProjectId) -> Result<(), DomainError> {
        let command = DeleteProject {
            correlation_id: Uuid::new_v4(),
            project_id: project_id.clone(),
        };
        handle_delete_project(&command, self.backend.as_ref()).await?;

        let is_open = self
            .state()
            .session
            .as_ref()
            .is_some_and(|session| &session.project.id == project_id);
        if is_open {
            self.close();
        }
        Ok(())
    }

    /// Opens `project`, cancelling everything in flight for the previous one,
    /// and initializes its chapters.
    ///
    /// # Errors
    ///
    /// Returns the initialization error. The project stays open with no
    /// chapters so `initialize` can be retried.
    pub async fn open(&self, project: Project) -> Result<Vec<ChapterView>, DomainError> {
        {
            let mut state = self.state();
            if let Some(mut previous) = state.session.take() {
                info!(project_id = %previous.project.id, "closing project");
                previous.in_flight.cancel_all();
            }
            state.next_epoch += 1;
            let epoch = state.next_epoch;
            let cancel = CancellationToken::new();
            info!(project_id = %project.id, epoch, "opening project");
            state.session = Some(Session {
                epoch,
                store: ChapterStore::new(project.chapter_count),
                in_flight: InFlightRegistry::new(cancel.clone()),
                cancel,
                project,
            });
        }
        self.initialize().await
    }

    /// Fetches the chapter scaffold of the open project and replaces the
    /// local list with it. Chapters confirmed by another request while the
    /// reload was in flight, or still busy when it lands, keep their local
    /// record.
    ///
    /// # Errors
    ///
    /// Returns the backend's error, or `DomainError::Validation` if the
    /// returned numbers do not match the project. The previous chapter list is
    /// kept on error.
    pub async fn initialize(&self) -> Result<Vec<ChapterView>, DomainError> {
        let (epoch, cancel, since, command) = self.with_session(|session| {
            let command = InitializeChapters {
                correlation_id: Uuid::new_v4(),
                project_id: session.project.id.clone(),
            };
            Ok((
                session.epoch,
                session.cancel.clone(),
                session.store.revisions(),
                command,
            ))
        })?;

        let chapters = until_cancelled(
            &cancel,
            handle_initialize_chapters(&command, self.backend.as_ref()),
        )
        .await?;

        self.with_epoch(epoch, |session| {
            let in_flight = &session.in_flight;
            let kept = session
                .store
                .replace_all(chapters, &since, |number| in_flight.is_active(number))?;
            if !kept.is_empty() {
                info!(?kept, "kept chapters that changed during reload");
            }
            Ok(session.views())
        })
    }

    /// Closes the open project and cancels its in-flight requests.
    pub fn close(&self) {
        if let Some(mut session) = self.state().session.take() {
            info!(project_id = %session.project.id, "closing project");
            session.in_flight.cancel_all();
        }
    }

    /// The open project, if any.
    #[must_use]
    pub fn project(&self) -> Option<Project> {
        self.state()
            .session
            .as_ref()
            .map(|session| session.project.clone())
    }

    /// All chapters of the open project in number order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NoOpenProject` if no project is open.
    pub fn chapters(&self) -> Result<Vec<ChapterView>, DomainError> {
        self.with_session(|session| Ok(session.views()))
    }

    /// One chapter of the open project.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NoOpenProject` or `DomainError::ChapterNotFound`.
    pub fn chapter(&self, number: u32) -> Result<ChapterView, DomainError> {
        self.with_session(|session| session.view(number))
    }

    /// Generates chapter `number`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ChapterBusy` if the chapter is already
    /// generating, `DomainError::InvalidTransition` while it is being edited,
    /// `DomainError::Cancelled` if a newer request or a project switch
    /// overtook this one, or the backend's error. Nothing changes on error.
    pub async fn generate(&self, number: u32) -> Result<GenerationOutcome, DomainError> {
        let (epoch, ticket, command) = self.with_session(|session| {
            session.store.transition(number, LifecycleEvent::Generate)?;
            let ticket = match session.in_flight.begin(number, OperationKind::Generate) {
                Ok(ticket) => ticket,
                Err(err) => {
                    generation::abandon(&mut session.store, number);
                    return Err(err);
                }
            };
            let command = GenerateChapter {
                correlation_id: Uuid::new_v4(),
                project_id: session.project.id.clone(),
                number,
            };
            Ok((session.epoch, ticket, command))
        })?;

        let result = until_cancelled(
            ticket.cancellation(),
            handle_generate_chapter(&command, self.backend.as_ref()),
        )
        .await;

        let reconciled = self.with_epoch(epoch, |session| {
            if !session.in_flight.finish(&ticket) {
                warn!(chapter = number, "ignoring stale generation response");
                return Err(DomainError::Cancelled);
            }
            generation::reconcile(&session.project, &mut session.store, number, result)
        })?;

        match reconciled {
            Reconciled::Content { chapter, pov } => {
                Ok(GenerationOutcome::Generated { chapter, pov })
            }
            Reconciled::Prompt(prompt) => {
                let clipboard = generation::hand_off_prompt(self.clipboard.as_ref(), &prompt).await;
                Ok(GenerationOutcome::PromptOnly { prompt, clipboard })
            }
        }
    }

    /// Fetches the generation prompt of chapter `number` without generating
    /// and copies it to the clipboard. An empty chapter becomes
    /// prompt-pending.
    ///
    /// # Errors
    ///
    /// Returns the backend's error, or `DomainError::Cancelled` if the project
    /// was closed meanwhile. Clipboard failure is reported in the outcome.
    pub async fn build_prompt(&self, number: u32) -> Result<PromptOutcome, DomainError> {
        let (epoch, cancel, command) = self.with_session(|session| {
            session.store.get(number)?;
            let command = BuildPrompt {
                correlation_id: Uuid::new_v4(),
                project_id: session.project.id.clone(),
                number,
            };
            Ok((session.epoch, session.cancel.clone(), command))
        })?;

        let prompt =
            until_cancelled(&cancel, handle_build_prompt(&command, self.backend.as_ref())).await?;

        self.with_epoch(epoch, |session| {
            session
                .store
                .transition(number, LifecycleEvent::PromptIssued)
        })?;

        let clipboard = generation::hand_off_prompt(self.clipboard.as_ref(), &prompt).await;
        Ok(PromptOutcome { prompt, clipboard })
    }

    /// Opens the editor on chapter `number` and returns its saved contents.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the chapter is
    /// generated, drafted or waiting on a prompt.
    pub fn begin_edit(&self, number: u32) -> Result<EditBuffer, DomainError> {
        self.with_session(|session| {
            session.store.transition(number, LifecycleEvent::Edit)?;
            let chapter = session.store.get(number)?;
            Ok(EditBuffer {
                number,
                title: chapter.title.clone(),
                content: chapter.content.clone(),
            })
        })
    }

    /// Closes the editor without saving; the chapter returns to the phase it
    /// had before editing with its last saved values.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` if the chapter is not being
    /// edited.
    pub fn cancel_edit(&self, number: u32) -> Result<ChapterView, DomainError> {
        self.with_session(|session| {
            session.store.transition(number, LifecycleEvent::Cancel)?;
            session.view(number)
        })
    }

    /// Saves the editor contents of chapter `number` as a draft.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` if the chapter is not being
    /// edited, `DomainError::Cancelled` if overtaken, or the backend's error.
    /// The editor stays open on error.
    pub async fn save_edit(
        &self,
        number: u32,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<ChapterView, DomainError> {
        let phase = self.with_session(|session| session.store.phase(number))?;
        if phase != ChapterPhase::Editing {
            return Err(DomainError::InvalidTransition {
                number,
                phase: phase.as_str(),
                action: "save",
            });
        }
        self.update(number, ChapterPatch::save_draft(title, content), true)
            .await
    }

    /// Sets the POV override of chapter `number`. The lifecycle phase is not
    /// affected.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ChapterBusy` while the chapter is generating,
    /// `DomainError::Cancelled` if overtaken, or the backend's error.
    pub async fn set_pov_override(&self, number: u32, pov: Pov) -> Result<ChapterView, DomainError> {
        self.update(number, ChapterPatch::pov(pov), false).await
    }

    /// Sends a partial update for chapter `number` and replaces only that
    /// chapter with the confirmed record.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ChapterBusy` while the chapter is generating,
    /// `DomainError::Cancelled` if overtaken, or the backend's error.
    pub async fn apply_update(
        &self,
        number: u32,
        patch: ChapterPatch,
    ) -> Result<ChapterView, DomainError> {
        self.update(number, patch, false).await
    }

    async fn update(
        &self,
        number: u32,
        patch: ChapterPatch,
        saving: bool,
    ) -> Result<ChapterView, DomainError> {
        let (epoch, ticket, command) = self.with_session(|session| {
            session.store.get(number)?;
            let ticket = session.in_flight.begin(number, OperationKind::Update)?;
            let command = UpdateChapter {
                correlation_id: Uuid::new_v4(),
                project_id: session.project.id.clone(),
                number,
                patch,
            };
            Ok((session.epoch, ticket, command))
        })?;

        let result = until_cancelled(
            ticket.cancellation(),
            handle_update_chapter(&command, self.backend.as_ref()),
        )
        .await;

        self.with_epoch(epoch, |session| {
            if !session.in_flight.finish(&ticket) {
                warn!(chapter = number, "ignoring superseded update response");
                return Err(DomainError::Cancelled);
            }
            let record = result?;
            let event = if saving && session.store.phase(number)? == ChapterPhase::Editing {
                LifecycleEvent::Save
            } else {
                LifecycleEvent::Reconciled(record.status)
            };
            session.store.merge(record)?;
            session.store.transition(number, event)?;
            session.view(number)
        })
    }

    /// Copies chapter `number` to the clipboard as Markdown.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Clipboard` if the write fails; chapter state is
    /// never touched.
    pub async fn copy_chapter(&self, number: u32) -> Result<(), DomainError> {
        let text = self.with_session(|session| Ok(session.store.get(number)?.to_markdown()))?;
        self.clipboard.write_text(&text).await
    }
}

/// Awaits `operation` unless `cancel` fires first.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    operation: impl Future<Output = Result<T, DomainError>>,
) -> Result<T, DomainError> {
    tokio::select! {
        () = cancel.cancelled() => Err(DomainError::Cancelled),
        result = operation => result,
    }
}
