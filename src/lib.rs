// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pool;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::dag::{Action, ActionRef, Plan};
use crate::errors::{PassPoolError, Result};
use crate::exec::ActionGraph;
use crate::pool::ExecPool;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - construction of the shared pass graph
/// - root selection (`--pass` or the configured roots)
/// - the worker pool lifecycle
/// - failure reporting once every plan has drained
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;
    let graph = ActionGraph::from_config(&cfg)?;

    let root_names = match &args.pass {
        Some(name) => vec![name.clone()],
        None => cfg.root_names(),
    };
    let roots = graph.roots(&root_names)?;
    let workers = args
        .workers
        .map(|w| w as usize)
        .unwrap_or_else(|| cfg.effective_workers());

    if args.dry_run {
        print_dry_run(&graph, &roots, workers);
        return Ok(());
    }

    info!(?root_names, workers, "scheduling pass roots");

    let pool = ExecPool::new(workers, &roots);
    pool.start();
    pool.dispose_and_wait().await;

    info!(
        plans = pool.plan_count(),
        executed = graph.executed(),
        passes = graph.len(),
        "all plans completed"
    );

    let failures = graph.failures();
    for (pass, code) in &failures {
        warn!(pass = %pass, exit_code = code, "pass failed");
    }

    match failures.into_iter().next() {
        Some((pass, code)) => Err(PassPoolError::PassFailed { pass, code }),
        None => Ok(()),
    }
}

/// Dry-run output: each root's plan, deepest level first, with the command
/// every entry would run.
fn print_dry_run(graph: &ActionGraph, roots: &[ActionRef], workers: usize) {
    println!("passpool dry-run");
    println!("  workers = {workers}");
    println!("  roots = {}", roots.len());
    println!();

    for root in roots {
        let plan = Plan::build(root, Arc::default());
        println!("plan for {} (max depth {}):", root.name(), plan.max_depth());
        for depth in (0..=plan.max_depth()).rev() {
            println!("  depth {depth}:");
            for action in plan.level(depth) {
                let cmd = graph.get(action.name()).map(|a| a.cmd()).unwrap_or("?");
                println!("    {}: {cmd}", action.name());
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
