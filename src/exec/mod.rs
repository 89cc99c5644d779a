// src/exec/mod.rs

//! Command-backed passes.
//!
//! The scheduler core only knows the [`Action`](crate::dag::Action) trait.
//! This module provides the implementation the `passpool` binary uses:
//!
//! - [`command`] runs a pass's shell command and records its outcome.
//! - [`graph`] turns a validated config into shared, deduplicated actions.

pub mod command;
pub mod graph;

pub use command::CommandAction;
pub use graph::ActionGraph;

/// Recorded outcome of a command-backed pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    Success,
    /// Non-zero exit code, or -1 if the process could not be started or was
    /// killed by a signal.
    Failed(i32),
}
