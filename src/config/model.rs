// src/config/model.rs

use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroUsize;

use serde::Deserialize;

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [pool]
/// workers = 4
/// roots = ["report"]
///
/// [pass.parse]
/// cmd = "echo parse"
///
/// [pass.report]
/// cmd = "echo report"
/// after = ["parse"]
/// ```
///
/// Every section is optional at the parsing stage; validation rejects a
/// file with no passes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Pool settings from `[pool]`.
    #[serde(default)]
    pub pool: PoolSection,

    /// All passes from `[pass.<name>]`, keyed by pass name.
    #[serde(default)]
    pub pass: BTreeMap<String, PassConfig>,
}

/// `[pool]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolSection {
    /// Number of concurrent workers. Defaults to the available parallelism.
    #[serde(default)]
    pub workers: Option<usize>,

    /// Passes to schedule as roots.
    ///
    /// If `None`, every pass that no other pass lists in `after` is a root.
    #[serde(default)]
    pub roots: Option<Vec<String>>,
}

/// `[pass.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PassConfig {
    /// Shell command that implements the pass.
    pub cmd: String,

    /// Direct dependencies, in the order they should be expanded.
    #[serde(default)]
    pub after: Vec<String>,
}

/// A validated configuration.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)`, which
/// guarantees every `after` and `roots` entry names a known pass and the
/// pass graph is acyclic.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub pool: PoolSection,
    pub pass: BTreeMap<String, PassConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(pool: PoolSection, pass: BTreeMap<String, PassConfig>) -> Self {
        Self { pool, pass }
    }

    /// Worker count from `[pool].workers`, or the available parallelism.
    pub fn effective_workers(&self) -> usize {
        self.pool.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }

    /// Names of the passes to schedule as roots, in a stable order.
    pub fn root_names(&self) -> Vec<String> {
        if let Some(roots) = &self.pool.roots {
            return roots.clone();
        }

        let depended_on: BTreeSet<&str> = self
            .pass
            .values()
            .flat_map(|p| p.after.iter().map(String::as_str))
            .collect();

        self.pass
            .keys()
            .filter(|name| !depended_on.contains(name.as_str()))
            .cloned()
            .collect()
    }
}
