// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `passpool`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "passpool",
    version,
    about = "Run a graph of analysis passes across a fixed pool of workers.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pass graph (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Number of workers; overrides `[pool].workers`.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub workers: Option<u32>,

    /// Schedule only this pass as a root (instead of the configured roots).
    #[arg(long, value_name = "NAME")]
    pub pass: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PASSPOOL_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print each root's plan, but don't run any pass.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
