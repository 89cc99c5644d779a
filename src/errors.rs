// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! The scheduler core (`dag`, `pool`) does not return errors; these cover
//! configuration, the command layer and the CLI entry point.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PassPoolError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Pass not found: {0}")]
    PassNotFound(String),

    #[error("Cycle detected in pass graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Pass '{pass}' failed with exit code {code}")]
    PassFailed { pass: String, code: i32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PassPoolError>;
