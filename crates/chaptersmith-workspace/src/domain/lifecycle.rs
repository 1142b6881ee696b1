//! Chapter lifecycle state machine.

use std::fmt;

use chaptersmith_core::chapter::ChapterStatus;
use chaptersmith_core::error::DomainError;
use serde::Serialize;

/// Where a chapter is in its lifecycle on this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChapterPhase {
    /// No content.
    Empty,
    /// A generation request is in flight.
    Generating,
    /// The backend handed back a prompt instead of content.
    PromptPending,
    /// Holds backend-generated content.
    Generated,
    /// The user has the editor open.
    Editing,
    /// Holds manually saved content.
    Draft,
}

impl ChapterPhase {
    /// Phase implied by a server status for a chapter nothing is happening to.
    #[must_use]
    pub fn from_status(status: ChapterStatus) -> Self {
        match status {
            ChapterStatus::Empty => Self::Empty,
            ChapterStatus::Draft => Self::Draft,
            ChapterStatus::Generated => Self::Generated,
        }
    }

    /// Returns the display name of this phase.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Generating => "generating",
            Self::PromptPending => "prompt_pending",
            Self::Generated => "generated",
            Self::Editing => "editing",
            Self::Draft => "draft",
        }
    }

    /// Folds a fresh server status into a settled phase. A prompt handed out
    /// for an empty chapter stays pending until content arrives.
    fn settle(self, status: ChapterStatus) -> Self {
        match (self, status) {
            (Self::PromptPending, ChapterStatus::Empty) => Self::PromptPending,
            _ => Self::from_status(status),
        }
    }
}

impl fmt::Display for ChapterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs that move a chapter between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A generation request is dispatched.
    Generate,
    /// The backend returned generated content.
    ContentReturned,
    /// The backend returned a prompt instead of content.
    PromptReturned,
    /// The generation request failed or was cancelled.
    GenerationAbandoned,
    /// A prompt was handed out through the explicit prompt path.
    PromptIssued,
    /// The user opened the editor.
    Edit,
    /// The editor contents were saved.
    Save,
    /// The editor was closed without saving.
    Cancel,
    /// A server record for the chapter arrived outside generation and editing.
    Reconciled(ChapterStatus),
}

impl LifecycleEvent {
    fn action(self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::ContentReturned => "accept content",
            Self::PromptReturned => "accept a prompt",
            Self::GenerationAbandoned => "abandon generation",
            Self::PromptIssued => "issue a prompt",
            Self::Edit => "edit",
            Self::Save => "save",
            Self::Cancel => "cancel editing",
            Self::Reconciled(_) => "reconcile",
        }
    }
}

/// Lifecycle of one chapter.
///
/// `resume` remembers the phase to return to when a generation is abandoned
/// or an edit is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    phase: ChapterPhase,
    resume: ChapterPhase,
}

impl Lifecycle {
    /// Starts a lifecycle from the server status of a chapter.
    #[must_use]
    pub fn from_status(status: ChapterStatus) -> Self {
        let phase = ChapterPhase::from_status(status);
        Self {
            phase,
            resume: phase,
        }
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> ChapterPhase {
        self.phase
    }

    /// Applies `event` to the chapter numbered `number`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ChapterBusy` when generating a chapter that is
    /// already generating, and `DomainError::InvalidTransition` for any other
    /// event the current phase does not accept. The lifecycle is unchanged on
    /// error.
    pub fn apply(
        &mut self,
        number: u32,
        event: LifecycleEvent,
    ) -> Result<ChapterPhase, DomainError> {
        use ChapterPhase as P;
        use LifecycleEvent as E;

        let next = match (self.phase, event) {
            (P::Generating, E::Generate) => return Err(DomainError::ChapterBusy(number)),
            (P::Empty | P::Generated | P::Draft | P::PromptPending, E::Generate)
            | (P::Generated | P::Draft | P::PromptPending, E::Edit) => {
                self.resume = self.phase;
                match event {
                    E::Generate => P::Generating,
                    _ => P::Editing,
                }
            }
            (P::Generating, E::ContentReturned) => P::Generated,
            (P::Generating, E::PromptReturned) => P::PromptPending,
            (P::Generating, E::GenerationAbandoned) | (P::Editing, E::Cancel) => self.resume,
            (P::Empty, E::PromptIssued) => P::PromptPending,
            (_, E::PromptIssued) => self.phase,
            (P::Editing, E::Save) => P::Draft,
            (P::Editing, E::Reconciled(status)) => {
                self.resume = self.resume.settle(status);
                P::Editing
            }
            (P::Generating, E::Reconciled(_)) => P::Generating,
            (phase, E::Reconciled(status)) => phase.settle(status),
            (phase, event) => {
                return Err(DomainError::InvalidTransition {
                    number,
                    phase: phase.as_str(),
                    action: event.action(),
                });
            }
        };

        self.phase = next;
        Ok(next)
    }
}
