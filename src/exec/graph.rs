// src/exec/graph.rs

//! Shared action graph built from a validated config.

use std::collections::BTreeMap;
use std::sync::Arc;

use petgraph::algo::toposort;
use tracing::debug;

use crate::config::{ConfigFile, dependency_graph};
use crate::dag::ActionRef;
use crate::errors::{PassPoolError, Result};
use crate::exec::{CommandAction, PassStatus};

/// One [`CommandAction`] per configured pass.
///
/// Each pass is allocated exactly once and every dependent holds a clone of
/// the same `Arc`, so a pass shared by several roots has a single identity
/// in the pool's execution registry.
#[derive(Debug)]
pub struct ActionGraph {
    actions: BTreeMap<String, Arc<CommandAction>>,
}

impl ActionGraph {
    /// Construct the actions in dependency order.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let graph = dependency_graph(&cfg.pass);
        let order = toposort(&graph, None).map_err(|cycle| {
            PassPoolError::DagCycle(format!(
                "cycle detected in pass graph involving pass '{}'",
                cycle.node_id()
            ))
        })?;

        let mut actions: BTreeMap<String, Arc<CommandAction>> = BTreeMap::new();

        for name in order {
            let pass = cfg
                .pass
                .get(name)
                .ok_or_else(|| PassPoolError::PassNotFound(name.to_string()))?;

            let deps = pass
                .after
                .iter()
                .map(|dep| {
                    actions
                        .get(dep)
                        .map(|a| Arc::clone(a) as ActionRef)
                        .ok_or_else(|| PassPoolError::PassNotFound(dep.clone()))
                })
                .collect::<Result<Vec<_>>>()?;

            debug!(pass = %name, deps = deps.len(), "constructed pass");
            actions.insert(
                name.to_string(),
                Arc::new(CommandAction::new(name, pass.cmd.clone(), deps)),
            );
        }

        Ok(Self { actions })
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<CommandAction>> {
        self.actions.get(name)
    }

    /// Resolve root names to shared action handles, preserving order.
    pub fn roots(&self, names: &[String]) -> Result<Vec<ActionRef>> {
        names
            .iter()
            .map(|name| {
                self.actions
                    .get(name)
                    .map(|a| Arc::clone(a) as ActionRef)
                    .ok_or_else(|| PassPoolError::PassNotFound(name.clone()))
            })
            .collect()
    }

    /// Passes that recorded a failure, with their exit codes, by name.
    pub fn failures(&self) -> Vec<(String, i32)> {
        self.actions
            .iter()
            .filter_map(|(name, action)| match action.status() {
                Some(PassStatus::Failed(code)) => Some((name.clone(), code)),
                _ => None,
            })
            .collect()
    }

    /// Number of passes that have run.
    pub fn executed(&self) -> usize {
        self.actions
            .values()
            .filter(|a| a.status().is_some())
            .count()
    }
}
