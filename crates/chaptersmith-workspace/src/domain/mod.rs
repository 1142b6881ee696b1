//! Domain model of an open project workspace.

pub mod commands;
pub mod lifecycle;
pub mod store;
