//! ChapterSmith — chapter lifecycle orchestration.
//!
//! Responsible for the per-chapter lifecycle, number-keyed reconciliation of
//! server records, generation dispatch and the workspace controller that
//! services user actions on one open project.

pub mod application;
pub mod domain;
