//! Parsing of shell command lines.

use chaptersmith_core::pov::Pov;
use chaptersmith_core::project::ProjectId;
use thiserror::Error;

/// One line typed at the shell prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// List projects.
    Projects,
    /// Create a project interactively, then open it.
    Create,
    /// Open a project by id.
    Open(ProjectId),
    /// Delete a project by id.
    Delete(ProjectId),
    /// Re-fetch the chapter list of the open project.
    Init,
    /// Show all chapters, or one chapter in full.
    Show(Option<u32>),
    /// Generate one or more chapters concurrently.
    Generate(Vec<u32>),
    /// Fetch a chapter's prompt without generating.
    Prompt(u32),
    /// Edit a chapter's title and content.
    Edit(u32),
    /// Close a chapter's editor without saving.
    Cancel(u32),
    /// Override a chapter's POV.
    Pov(u32, Pov),
    /// Copy a chapter as Markdown.
    Copy(u32),
    /// Close the open project.
    Close,
    /// Print the command list.
    Help,
    /// Leave the shell.
    Quit,
}

/// Why a command line was not understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The first word is not a command.
    #[error("unknown command {0:?}; type 'help' for the command list")]
    Unknown(String),
    /// The command's arguments are missing or malformed.
    #[error("usage: {0}")]
    Usage(&'static str),
}

impl ShellCommand {
    /// Parses a non-empty command line.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` for unknown commands and malformed arguments.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(ParseError::Usage("help"));
        };
        let args: Vec<&str> = words.collect();

        let command = match name.to_ascii_lowercase().as_str() {
            "projects" | "ls" => Self::Projects,
            "create" | "new" => Self::Create,
            "open" => Self::Open(project_id(&args, "open <project-id>")?),
            "delete" | "rm" => Self::Delete(project_id(&args, "delete <project-id>")?),
            "init" => Self::Init,
            "show" => match args.as_slice() {
                [] => Self::Show(None),
                [number] => Self::Show(Some(chapter(number, "show [chapter]")?)),
                _ => return Err(ParseError::Usage("show [chapter]")),
            },
            "generate" | "gen" => {
                const USAGE: &str = "generate <chapter> [chapter...]";
                if args.is_empty() {
                    return Err(ParseError::Usage(USAGE));
                }
                let mut numbers = args
                    .iter()
                    .map(|arg| chapter(arg, USAGE))
                    .collect::<Result<Vec<_>, _>>()?;
                numbers.sort_unstable();
                numbers.dedup();
                Self::Generate(numbers)
            }
            "prompt" => Self::Prompt(single_chapter(&args, "prompt <chapter>")?),
            "edit" => Self::Edit(single_chapter(&args, "edit <chapter>")?),
            "cancel" => Self::Cancel(single_chapter(&args, "cancel <chapter>")?),
            "pov" => {
                const USAGE: &str = "pov <chapter> female|male";
                let [number, pov] = args.as_slice() else {
                    return Err(ParseError::Usage(USAGE));
                };
                let pov = pov.parse::<Pov>().map_err(|_| ParseError::Usage(USAGE))?;
                Self::Pov(chapter(number, USAGE)?, pov)
            }
            "copy" => Self::Copy(single_chapter(&args, "copy <chapter>")?),
            "close" => Self::Close,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(ParseError::Unknown(other.to_owned())),
        };
        Ok(command)
    }
}

fn project_id(args: &[&str], usage: &'static str) -> Result<ProjectId, ParseError> {
    match args {
        [id] => Ok(ProjectId::from(*id)),
        _ => Err(ParseError::Usage(usage)),
    }
}

fn single_chapter(args: &[&str], usage: &'static str) -> Result<u32, ParseError> {
    match args {
        [number] => chapter(number, usage),
        _ => Err(ParseError::Usage(usage)),
    }
}

fn chapter(arg: &str, usage: &'static str) -> Result<u32, ParseError> {
    arg.parse::<u32>()
        .ok()
        .filter(|number| *number > 0)
        .ok_or(ParseError::Usage(usage))
}

/// The command list printed by `help`.
pub const HELP: &str = "\
Projects
  projects                 list projects
  create                   create a project and open it
  open <id>                open a project
  delete <id>              delete a project
  close                    close the open project
Chapters
  init                     reload the chapter list
  show [n]                 list chapters, or print chapter n
  generate <n> [n...]      generate chapters (prompt is copied if the server has no model)
  prompt <n>               copy chapter n's prompt without generating
  edit <n>                 set title and content; end content with '.' alone, '!' cancels
  cancel <n>               close chapter n's editor without saving
  pov <n> female|male      override chapter n's POV
  copy <n>                 copy chapter n as Markdown
Other
  help                     this list
  quit                     leave";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_chapter_commands() {
        assert_eq!(
            ShellCommand::parse("generate 2"),
            Ok(ShellCommand::Generate(vec![2]))
        );
        assert_eq!(
            ShellCommand::parse("GEN 3 1 3"),
            Ok(ShellCommand::Generate(vec![1, 3]))
        );
        assert_eq!(
            ShellCommand::parse("pov 3 male"),
            Ok(ShellCommand::Pov(3, Pov::Male))
        );
        assert_eq!(ShellCommand::parse("show"), Ok(ShellCommand::Show(None)));
        assert_eq!(
            ShellCommand::parse("show 4"),
            Ok(ShellCommand::Show(Some(4)))
        );
        assert_eq!(ShellCommand::parse("edit 1"), Ok(ShellCommand::Edit(1)));
    }

    #[test]
    fn test_parses_project_commands() {
        assert_eq!(
            ShellCommand::parse("open project-7"),
            Ok(ShellCommand::Open(ProjectId::from("project-7")))
        );
        assert_eq!(ShellCommand::parse("  quit  "), Ok(ShellCommand::Quit));
    }

    #[test]
    fn test_rejects_bad_arguments() {
        for line in ["generate", "generate two", "edit 0", "pov 1 dual", "open", "copy 1 2"] {
            assert!(
                matches!(ShellCommand::parse(line), Err(ParseError::Usage(_))),
                "{line} should be a usage error"
            );
        }
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            ShellCommand::parse("publish 1"),
            Err(ParseError::Unknown("publish".to_owned()))
        );
    }
}
