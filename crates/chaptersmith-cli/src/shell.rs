//! Interactive shell over a [`Workspace`].
//!
//! Reads one command per line, runs it against the workspace and prints the
//! result. Workspace errors are printed and the shell keeps going; only
//! terminal I/O failures end the session.

use std::io::Write;
use std::sync::Arc;

use chaptersmith_core::error::DomainError;
use chaptersmith_core::pov::PovMode;
use chaptersmith_core::project::{DEFAULT_PROJECT_NAME, NewProject, ProjectId};
use chaptersmith_workspace::application::generation::GenerationOutcome;
use chaptersmith_workspace::application::views::ChapterView;
use chaptersmith_workspace::application::workspace::Workspace;
use chaptersmith_workspace::domain::lifecycle::ChapterPhase;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::task::JoinSet;

use crate::command::{HELP, ShellCommand};
use crate::error::AppError;

/// Text shown before each command.
pub const PROMPT: &str = "chaptersmith> ";

/// Ends a multi-line block.
const END_OF_BLOCK: &str = ".";
/// Abandons a multi-line block.
const ABORT_BLOCK: &str = "!";

const CHAPTER_COUNTS: std::ops::RangeInclusive<u32> = 3..=6;
const DEFAULT_CHAPTER_COUNT: u32 = 3;

enum Block {
    Text(String),
    Aborted,
    Ended,
}

/// The interactive shell.
pub struct Shell<R, W> {
    workspace: Arc<Workspace>,
    input: Lines<R>,
    output: W,
}

impl<R, W> Shell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    /// Creates a shell reading commands from `input` and printing to `output`.
    pub fn new(workspace: Arc<Workspace>, input: R, output: W) -> Self {
        Self {
            workspace,
            input: input.lines(),
            output,
        }
    }

    /// Returns the output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs commands until `quit` or the end of input, then closes the
    /// workspace.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if reading input or writing output fails.
    pub async fn run(&mut self) -> Result<(), AppError> {
        writeln!(self.output, "ChapterSmith. Type 'help' for commands.")?;
        loop {
            write!(self.output, "{PROMPT}")?;
            self.output.flush()?;

            let Some(line) = self.input.next_line().await? else {
                break;
            };
            let command = match line.trim() {
                "" => continue,
                line => ShellCommand::parse(line),
            };
            let command = match command {
                Ok(ShellCommand::Quit) => break,
                Ok(command) => command,
                Err(err) => {
                    writeln!(self.output, "{err}")?;
                    continue;
                }
            };

            match self.execute(command).await {
                Ok(()) => {}
                Err(err) if err.is_recoverable() => writeln!(self.output, "error: {err}")?,
                Err(err) => return Err(err),
            }
        }

        self.workspace.close();
        writeln!(self.output, "Goodbye.")?;
        Ok(())
    }

    async fn execute(&mut self, command: ShellCommand) -> Result<(), AppError> {
        match command {
            ShellCommand::Projects => self.list_projects().await,
            ShellCommand::Create => self.create_project().await,
            ShellCommand::Open(id) => self.open_project(&id).await,
            ShellCommand::Delete(id) => {
                self.workspace.delete_project(&id).await?;
                writeln!(self.output, "Deleted project {id}.")?;
                Ok(())
            }
            ShellCommand::Init => {
                let chapters = self.workspace.initialize().await?;
                self.print_chapters(&chapters)
            }
            ShellCommand::Show(None) => {
                let chapters = self.workspace.chapters()?;
                self.print_chapters(&chapters)
            }
            ShellCommand::Show(Some(number)) => {
                let view = self.workspace.chapter(number)?;
                writeln!(self.output, "{}", chapter_line(&view))?;
                writeln!(self.output, "\n# {}\n\n{}", view.title, view.content)?;
                Ok(())
            }
            ShellCommand::Generate(numbers) => self.generate(numbers).await,
            ShellCommand::Prompt(number) => {
                let outcome = self.workspace.build_prompt(number).await?;
                self.print_prompt(&outcome.prompt)?;
                writeln!(self.output, "Prompt {}.", outcome.clipboard)?;
                Ok(())
            }
            ShellCommand::Edit(number) => self.edit(number).await,
            ShellCommand::Cancel(number) => {
                let view = self.workspace.cancel_edit(number)?;
                writeln!(self.output, "Edit cancelled.\n{}", chapter_line(&view))?;
                Ok(())
            }
            ShellCommand::Pov(number, pov) => {
                let view = self.workspace.set_pov_override(number, pov).await?;
                writeln!(self.output, "{}", chapter_line(&view))?;
                Ok(())
            }
            ShellCommand::Copy(number) => {
                self.workspace.copy_chapter(number).await?;
                writeln!(self.output, "Chapter {number} copied to clipboard.")?;
                Ok(())
            }
            ShellCommand::Close => {
                self.workspace.close();
                writeln!(self.output, "Project closed.")?;
                Ok(())
            }
            ShellCommand::Help => {
                writeln!(self.output, "{HELP}")?;
                Ok(())
            }
            ShellCommand::Quit => Ok(()),
        }
    }

    async fn list_projects(&mut self) -> Result<(), AppError> {
        let projects = self.workspace.list_projects().await?;
        if projects.is_empty() {
            writeln!(self.output, "No projects yet. Use 'create'.")?;
            return Ok(());
        }
        let open = self.workspace.project().map(|project| project.id);
        for project in projects {
            let marker = if open.as_ref() == Some(&project.id) { "*" } else { " " };
            writeln!(
                self.output,
                "{marker} {}  {}  ({} chapters, POV {})",
                project.id, project.name, project.chapter_count, project.pov_mode
            )?;
        }
        Ok(())
    }

    async fn create_project(&mut self) -> Result<(), AppError> {
        let Some(name) = self
            .ask(&format!("Project name [{DEFAULT_PROJECT_NAME}]: "))
            .await?
        else {
            return self.aborted();
        };
        let name = if name.is_empty() {
            DEFAULT_PROJECT_NAME.to_owned()
        } else {
            name
        };

        writeln!(
            self.output,
            "Outline (end with '{END_OF_BLOCK}' on its own line, '{ABORT_BLOCK}' cancels):"
        )?;
        let outline = match self.read_block().await? {
            Block::Text(outline) => outline,
            Block::Aborted | Block::Ended => return self.aborted(),
        };

        let Some(chapter_count) = self.ask_chapter_count().await? else {
            return self.aborted();
        };
        let Some(pov_mode) = self.ask_pov_mode().await? else {
            return self.aborted();
        };

        let project = self
            .workspace
            .create_project(NewProject::new(name, outline, chapter_count, pov_mode))
            .await?;
        writeln!(self.output, "Created project {}.", project.id)?;
        let chapters = self.workspace.open(project).await?;
        self.print_chapters(&chapters)
    }

    async fn ask_chapter_count(&mut self) -> Result<Option<u32>, AppError> {
        let (low, high) = (*CHAPTER_COUNTS.start(), *CHAPTER_COUNTS.end());
        loop {
            let question = format!("Chapters {low}-{high} [{DEFAULT_CHAPTER_COUNT}]: ");
            let Some(answer) = self.ask(&question).await? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(Some(DEFAULT_CHAPTER_COUNT));
            }
            match answer.parse::<u32>() {
                Ok(count) if CHAPTER_COUNTS.contains(&count) => return Ok(Some(count)),
                _ => writeln!(self.output, "Enter a number from {low} to {high}.")?,
            }
        }
    }

    async fn ask_pov_mode(&mut self) -> Result<Option<PovMode>, AppError> {
        loop {
            let Some(answer) = self.ask("POV female|male|dual [female]: ").await? else {
                return Ok(None);
            };
            if answer.is_empty() {
                return Ok(Some(PovMode::default()));
            }
            match answer.parse::<PovMode>() {
                Ok(mode) => return Ok(Some(mode)),
                Err(err) => writeln!(self.output, "{err}")?,
            }
        }
    }

    async fn open_project(&mut self, id: &ProjectId) -> Result<(), AppError> {
        let project = self
            .workspace
            .list_projects()
            .await?
            .into_iter()
            .find(|project| &project.id == id)
            .ok_or_else(|| DomainError::Validation(format!("no project with id {id}")))?;
        writeln!(
            self.output,
            "Opened {} ({} chapters, POV {}).",
            project.name, project.chapter_count, project.pov_mode
        )?;
        let chapters = self.workspace.open(project).await?;
        self.print_chapters(&chapters)
    }

    /// Generates every chapter in `numbers` concurrently and reports each
    /// result as it arrives.
    async fn generate(&mut self, numbers: Vec<u32>) -> Result<(), AppError> {
        let mut tasks = JoinSet::new();
        for number in numbers {
            let workspace = Arc::clone(&self.workspace);
            tasks.spawn(async move { (number, workspace.generate(number).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((number, Ok(outcome))) => {
                    if let GenerationOutcome::PromptOnly { prompt, .. } = &outcome {
                        self.print_prompt(prompt)?;
                    }
                    writeln!(self.output, "Chapter {number}: {}", outcome.notice())?;
                }
                Ok((number, Err(err))) => {
                    writeln!(self.output, "error: chapter {number}: {err}")?;
                }
                Err(err) => writeln!(self.output, "error: generation task failed: {err}")?,
            }
        }
        Ok(())
    }

    async fn edit(&mut self, number: u32) -> Result<(), AppError> {
        let current = self.workspace.chapter(number)?;
        let (title, content) = if current.phase == ChapterPhase::Editing {
            (current.title, current.content)
        } else {
            let buffer = self.workspace.begin_edit(number)?;
            (buffer.title, buffer.content)
        };

        writeln!(
            self.output,
            "Editing chapter {number} ({} words saved).",
            chaptersmith_core::chapter::word_count(&content)
        )?;
        let Some(new_title) = self.ask(&format!("Title [{title}]: ")).await? else {
            return self.left_open(number);
        };
        writeln!(
            self.output,
            "Content (end with '{END_OF_BLOCK}' on its own line, '{ABORT_BLOCK}' cancels, \
             empty keeps the saved text):"
        )?;
        let new_content = match self.read_block().await? {
            Block::Text(text) => text,
            Block::Aborted => {
                let view = self.workspace.cancel_edit(number)?;
                writeln!(self.output, "Edit cancelled.\n{}", chapter_line(&view))?;
                return Ok(());
            }
            Block::Ended => return self.left_open(number),
        };

        let title = if new_title.is_empty() { title } else { new_title };
        let content = if new_content.is_empty() {
            content
        } else {
            new_content
        };
        let view = self.workspace.save_edit(number, title, content).await?;
        writeln!(self.output, "Saved.\n{}", chapter_line(&view))?;
        Ok(())
    }

    fn left_open(&mut self, number: u32) -> Result<(), AppError> {
        writeln!(
            self.output,
            "Input ended; chapter {number} is still being edited. \
             Use 'edit {number}' or 'cancel {number}'."
        )?;
        Ok(())
    }

    fn aborted(&mut self) -> Result<(), AppError> {
        writeln!(self.output, "Aborted.")?;
        Ok(())
    }

    fn print_chapters(&mut self, chapters: &[ChapterView]) -> Result<(), AppError> {
        if let Some(project) = self.workspace.project() {
            writeln!(
                self.output,
                "{} [{}], POV {}",
                project.name, project.id, project.pov_mode
            )?;
        }
        for view in chapters {
            writeln!(self.output, "{}", chapter_line(view))?;
        }
        Ok(())
    }

    fn print_prompt(&mut self, prompt: &str) -> Result<(), AppError> {
        writeln!(self.output, "----- prompt -----\n{prompt}\n------------------")?;
        Ok(())
    }

    /// Prints `question` and reads one trimmed answer. `None` at end of input.
    async fn ask(&mut self, question: &str) -> Result<Option<String>, AppError> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        Ok(self
            .input
            .next_line()
            .await?
            .map(|answer| answer.trim().to_owned()))
    }

    async fn read_block(&mut self) -> Result<Block, AppError> {
        let mut lines = Vec::new();
        while let Some(line) = self.input.next_line().await? {
            match line.trim_end() {
                END_OF_BLOCK => return Ok(Block::Text(lines.join("\n").trim().to_owned())),
                ABORT_BLOCK => return Ok(Block::Aborted),
                text => lines.push(text.to_owned()),
            }
        }
        Ok(Block::Ended)
    }
}

/// One row of the chapter listing.
#[must_use]
pub fn chapter_line(view: &ChapterView) -> String {
    let title: String = view.title.chars().take(32).collect();
    let pov = if view.pov_override.is_some() {
        format!("{} (set)", view.pov.as_str())
    } else {
        view.pov.as_str().to_owned()
    };
    let range = if view.in_range { "" } else { "  [out of range]" };
    format!(
        "{:>2}  {title:<32}  {pov:<12}  {:<14}  {:>5} words{range}",
        view.number,
        view.phase.as_str(),
        view.words
    )
}
