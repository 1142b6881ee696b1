//! Generation orchestration.
//!
//! Dispatches a generate request, interprets the two response modes and
//! folds the result into the chapter store and lifecycle.

use std::fmt;

use chaptersmith_core::backend::{Generation, StoryBackend};
use chaptersmith_core::chapter::Chapter;
use chaptersmith_core::clipboard::Clipboard;
use chaptersmith_core::error::DomainError;
use chaptersmith_core::pov::Pov;
use chaptersmith_core::project::Project;
use tracing::{info, instrument, warn};

use crate::domain::commands::GenerateChapter;
use crate::domain::lifecycle::LifecycleEvent;
use crate::domain::store::ChapterStore;

/// Shown when the backend answers a generate request with a prompt.
pub const PROMPT_ONLY_NOTICE: &str = "No LLM configured on server. Prompt copied to clipboard. \
     Paste into your model, then use Edit to save the result.";

/// Result of handing a prompt to the clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardStatus {
    /// The prompt is on the clipboard.
    Copied,
    /// The write failed; the prompt is still returned to the caller.
    Failed(String),
}

impl fmt::Display for ClipboardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Copied => f.write_str("copied to clipboard"),
            Self::Failed(reason) => write!(f, "clipboard write failed: {reason}"),
        }
    }
}

/// What a successful `generate` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The backend wrote the chapter; the store holds the returned record.
    Generated {
        /// The chapter as confirmed by the backend.
        chapter: Chapter,
        /// The POV the chapter resolves to.
        pov: Pov,
    },
    /// The backend has no model. Nothing in the store changed.
    PromptOnly {
        /// Prompt to run through an external model.
        prompt: String,
        /// Whether the prompt reached the clipboard.
        clipboard: ClipboardStatus,
    },
}

impl GenerationOutcome {
    /// Message to show the user.
    #[must_use]
    pub fn notice(&self) -> String {
        match self {
            Self::Generated { chapter, pov } => format!(
                "Chapter {} generated ({} words, POV {pov}).",
                chapter.number,
                chapter.words()
            ),
            Self::PromptOnly {
                clipboard: ClipboardStatus::Copied,
                ..
            } => PROMPT_ONLY_NOTICE.to_owned(),
            Self::PromptOnly {
                clipboard: ClipboardStatus::Failed(reason),
                ..
            } => format!(
                "No LLM configured on server. Copying the prompt failed ({reason}); \
                 copy it manually, run it through your model, then use Edit to save the result."
            ),
        }
    }
}

/// A generation response after it was applied to the store.
#[derive(Debug)]
pub(crate) enum Reconciled {
    Content { chapter: Chapter, pov: Pov },
    Prompt(String),
}

/// Handles the `GenerateChapter` command: the single call to the generation
/// endpoint.
///
/// # Errors
///
/// Returns the backend's error if generation fails.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, chapter = command.number))]
pub async fn handle_generate_chapter(
    command: &GenerateChapter,
    backend: &dyn StoryBackend,
) -> Result<Generation, DomainError> {
    info!(project_id = %command.project_id, "dispatching generation");
    backend
        .generate_chapter(command.correlation_id, &command.project_id, command.number)
        .await
}

/// Applies a generation result to chapter `number`, which must be generating.
///
/// Content replaces the record and marks the chapter generated. A prompt
/// leaves the record alone. A failure returns the chapter to the phase it had
/// before generating and passes the error through.
pub(crate) fn reconcile(
    project: &Project,
    store: &mut ChapterStore,
    number: u32,
    result: Result<Generation, DomainError>,
) -> Result<Reconciled, DomainError> {
    match result {
        Ok(Generation::Content(record)) if record.number == number => {
            store.merge(record)?;
            store.transition(number, LifecycleEvent::ContentReturned)?;
            let chapter = store.get(number)?.clone();
            let pov = project.pov_for(number, chapter.pov);
            info!(chapter = number, words = chapter.words(), %pov, "chapter generated");
            Ok(Reconciled::Content { chapter, pov })
        }
        Ok(Generation::Content(record)) => {
            abandon(store, number);
            Err(DomainError::Transport(format!(
                "generation of chapter {number} answered with chapter {}",
                record.number
            )))
        }
        Ok(Generation::PromptOnly { prompt, .. }) => {
            store.transition(number, LifecycleEvent::PromptReturned)?;
            info!(chapter = number, "backend returned prompt only");
            Ok(Reconciled::Prompt(prompt))
        }
        Err(err) => {
            warn!(chapter = number, error = %err, "generation failed");
            abandon(store, number);
            Err(err)
        }
    }
}

/// Returns a generating chapter to its previous phase.
pub(crate) fn abandon(store: &mut ChapterStore, number: u32) {
    if let Err(err) = store.transition(number, LifecycleEvent::GenerationAbandoned) {
        warn!(chapter = number, error = %err, "could not abandon generation");
    }
}

/// Writes `prompt` to the clipboard once. Failure is reported, not raised.
pub async fn hand_off_prompt(clipboard: &dyn Clipboard, prompt: &str) -> ClipboardStatus {
    match clipboard.write_text(prompt).await {
        Ok(()) => ClipboardStatus::Copied,
        Err(err) => {
            warn!(error = %err, "prompt not copied to clipboard");
            ClipboardStatus::Failed(err.to_string())
        }
    }
}
