//! ChapterSmith interactive shell.
//!
//! Wires the HTTP backend and the system clipboard into a workspace and
//! drives it from line commands.

pub mod clipboard;
pub mod command;
pub mod config;
pub mod error;
pub mod shell;
