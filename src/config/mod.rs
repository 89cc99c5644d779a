// src/config/mod.rs

//! Configuration loading and validation for passpool.
//!
//! Responsibilities:
//! - Define the TOML-backed pass graph (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate dependency references and acyclicity (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, PassConfig, PoolSection, RawConfigFile};
pub use validate::dependency_graph;
