//! System clipboard access.
//!
//! Writes go to the native clipboard through `arboard` unless a copy program
//! such as `wl-copy` is configured.

use std::process::Stdio;

use async_trait::async_trait;
use chaptersmith_core::clipboard::Clipboard;
use chaptersmith_core::error::DomainError;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// A program that reads clipboard text from stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardCommand {
    /// Executable name or path.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<String>,
}

impl ClipboardCommand {
    /// Splits a command line on whitespace. Returns `None` if it is blank.
    #[must_use]
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut words = command_line.split_whitespace().map(str::to_owned);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }
}

/// The user's clipboard. Each write happens once; nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemClipboard {
    /// The platform clipboard.
    Native,
    /// A copy program fed through stdin, spawned once per write.
    Command(ClipboardCommand),
}

impl SystemClipboard {
    /// The configured copy program, or the native clipboard without one.
    #[must_use]
    pub fn new(command: Option<ClipboardCommand>) -> Self {
        command.map_or(Self::Native, Self::Command)
    }
}

async fn write_native(text: &str) -> Result<(), DomainError> {
    let text = text.to_owned();
    tokio::task::spawn_blocking(move || {
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.set_text(text)
    })
    .await
    .map_err(|err| DomainError::Clipboard(format!("clipboard task failed: {err}")))?
    .map_err(|err| DomainError::Clipboard(err.to_string()))
}

async fn write_through(command: &ClipboardCommand, text: &str) -> Result<(), DomainError> {
    let program = &command.program;
    let mut child = Command::new(program)
        .args(&command.args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| DomainError::Clipboard(format!("failed to spawn {program}: {err}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|err| {
                DomainError::Clipboard(format!("failed to write to {program}: {err}"))
            })?;
    }

    let status = child
        .wait()
        .await
        .map_err(|err| DomainError::Clipboard(format!("{program} failed: {err}")))?;
    if !status.success() {
        return Err(DomainError::Clipboard(format!("{program} exited with {status}")));
    }
    Ok(())
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<(), DomainError> {
        match self {
            Self::Native => write_native(text).await?,
            Self::Command(command) => write_through(command, text).await?,
        }
        debug!(bytes = text.len(), clipboard = ?self, "clipboard written");
        Ok(())
    }
}
