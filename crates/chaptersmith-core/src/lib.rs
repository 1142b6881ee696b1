//! ChapterSmith Core — shared story model and collaborator contracts.
//!
//! This crate defines the project and chapter records, POV resolution,
//! word-count conformance and the traits the workspace talks to. It contains
//! no infrastructure code.

pub mod backend;
pub mod chapter;
pub mod clipboard;
pub mod error;
pub mod pov;
pub mod project;
