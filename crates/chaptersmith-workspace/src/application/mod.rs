//! Application layer: backend handlers, generation orchestration and the
//! workspace controller.

pub mod chapter_handlers;
pub mod generation;
pub mod in_flight;
pub mod project_handlers;
pub mod views;
pub mod workspace;
