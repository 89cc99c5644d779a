// src/config/validate.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, PassConfig, RawConfigFile};
use crate::errors::{PassPoolError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PassPoolError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.pool, raw.pass))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_passes(cfg)?;
    validate_pool_section(cfg)?;
    validate_pass_dependencies(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_passes(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pass.is_empty() {
        return Err(PassPoolError::ConfigError(
            "config must contain at least one [pass.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_pool_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pool.workers == Some(0) {
        return Err(PassPoolError::ConfigError(
            "[pool].workers must be >= 1 (got 0)".to_string(),
        ));
    }

    if let Some(roots) = &cfg.pool.roots {
        for root in roots {
            if !cfg.pass.contains_key(root) {
                return Err(PassPoolError::ConfigError(format!(
                    "[pool].roots names unknown pass '{}'",
                    root
                )));
            }
        }
    }

    Ok(())
}

fn validate_pass_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, pass) in cfg.pass.iter() {
        for dep in pass.after.iter() {
            if !cfg.pass.contains_key(dep) {
                return Err(PassPoolError::ConfigError(format!(
                    "pass '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
            if dep == name {
                return Err(PassPoolError::ConfigError(format!(
                    "pass '{}' cannot depend on itself in `after`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    let graph = dependency_graph(&cfg.pass);

    // A topological sort fails if there is a cycle. Plan expansion does not
    // guard against cycles, so this is the only line of defence.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(PassPoolError::DagCycle(format!(
            "cycle detected in pass graph involving pass '{}'",
            cycle.node_id()
        ))),
    }
}

/// Build the pass graph with edges pointing from dependency to dependent.
///
/// For
/// ```toml
/// [pass.lint]
/// after = ["parse"]
/// ```
/// the graph has the edge `parse -> lint`, so a topological order lists
/// every pass after all of its dependencies.
pub fn dependency_graph(passes: &BTreeMap<String, PassConfig>) -> DiGraphMap<&str, ()> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in passes.keys() {
        graph.add_node(name.as_str());
    }

    for (name, pass) in passes.iter() {
        for dep in pass.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    graph
}
