// src/dag/plan.rs

//! Per-root dependency plans.
//!
//! A [`Plan`] flattens the transitive dependencies of one root into levels
//! keyed by discovery depth and runs them deepest-first. Depth is the length
//! of the path along which an action was discovered, not its topological
//! rank, so an action reachable along several paths appears once per path.
//! The shared [`ExecutionRegistry`] turns those duplicates into no-ops.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::dag::action::{Action, ActionRef};
use crate::dag::plan_step::{ClaimAttempt, PlanStep};
use crate::dag::registry::ExecutionRegistry;

/// Dependency levels for one root, plus the registry shared across the pool.
pub struct Plan {
    /// `levels[d]` holds every action discovered at depth `d`, in discovery
    /// order. `levels[0]` is always exactly the root.
    levels: Vec<Vec<ActionRef>>,
    registry: Arc<ExecutionRegistry>,
}

impl fmt::Debug for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let levels: Vec<Vec<&str>> = self
            .levels
            .iter()
            .map(|level| level.iter().map(|a| a.name()).collect())
            .collect();
        f.debug_struct("Plan").field("levels", &levels).finish()
    }
}

impl Plan {
    /// Expand `root` into depth levels.
    ///
    /// The walk is a plain recursion over `deps()`: a cyclic graph never
    /// terminates. Callers are expected to hand in acyclic graphs
    /// (the config layer rejects cycles before building actions).
    pub fn build(root: &ActionRef, registry: Arc<ExecutionRegistry>) -> Self {
        let mut levels = vec![vec![Arc::clone(root)]];
        add_actions_at(1, root.deps(), &mut levels);

        Self { levels, registry }
    }

    pub fn root(&self) -> &ActionRef {
        &self.levels[0][0]
    }

    /// Largest depth present; 0 for a root without dependencies.
    pub fn max_depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Actions discovered at `depth`, in discovery order.
    pub fn level(&self, depth: usize) -> &[ActionRef] {
        self.levels.get(depth).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of entries across all levels, duplicates included.
    pub fn len(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every level from `max_depth` down to 0 (production API).
    ///
    /// Stops early, without claiming anything further, once the shared
    /// registry has been halted.
    pub fn run(&self) {
        self.run_internal(|_, _, _| {});
    }

    /// Manual-step variant of [`Plan::run`] that records every claim attempt.
    pub fn step_run(&self) -> PlanStep {
        let mut step = PlanStep::default();
        self.run_internal(|action, depth, claimed| {
            step.attempts.push(ClaimAttempt {
                action: action.name().to_string(),
                depth,
                claimed,
            });
        });
        step
    }

    fn run_internal(&self, mut on_attempt: impl FnMut(&ActionRef, usize, bool)) {
        for depth in (0..self.levels.len()).rev() {
            for action in &self.levels[depth] {
                if self.registry.is_halted() {
                    debug!(
                        root = %self.root().name(),
                        next = %action.name(),
                        depth,
                        "registry halted; abandoning plan"
                    );
                    return;
                }
                let claimed = self.execute(action, depth);
                on_attempt(action, depth, claimed);
            }
        }
    }

    /// Claim and run a single action. Returns whether this call ran it.
    fn execute(&self, action: &ActionRef, depth: usize) -> bool {
        if !self.registry.claim(action) {
            return false;
        }

        debug!(
            pass = %action.name(),
            depth,
            root = %self.root().name(),
            "executing pass"
        );

        action.exec();
        true
    }
}

fn add_actions_at(depth: usize, actions: &[ActionRef], levels: &mut Vec<Vec<ActionRef>>) {
    for action in actions {
        if levels.len() <= depth {
            levels.resize_with(depth + 1, Vec::new);
        }
        levels[depth].push(Arc::clone(action));
        add_actions_at(depth + 1, action.deps(), levels);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Node {
        name: &'static str,
        deps: Vec<ActionRef>,
        runs: AtomicUsize,
    }

    impl Action for Node {
        fn name(&self) -> &str {
            self.name
        }

        fn deps(&self) -> &[ActionRef] {
            &self.deps
        }

        fn exec(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn node(name: &'static str, deps: &[&Arc<Node>]) -> Arc<Node> {
        Arc::new(Node {
            name,
            deps: deps.iter().map(|d| Arc::clone(*d) as ActionRef).collect(),
            runs: AtomicUsize::new(0),
        })
    }

    fn names(plan: &Plan, depth: usize) -> Vec<&str> {
        plan.level(depth).iter().map(|a| a.name()).collect()
    }

    #[test]
    fn root_without_deps_is_single_level() {
        let a = node("a", &[]);
        let plan = Plan::build(&(a.clone() as ActionRef), Arc::default());

        assert_eq!(plan.max_depth(), 0);
        assert_eq!(names(&plan, 0), vec!["a"]);
        assert!(plan.level(1).is_empty());
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn diamond_keeps_one_entry_per_discovery_path() {
        // a -> b -> d, a -> c -> d
        let d = node("d", &[]);
        let b = node("b", &[&d]);
        let c = node("c", &[&d]);
        let a = node("a", &[&b, &c]);

        let plan = Plan::build(&(a.clone() as ActionRef), Arc::default());

        assert_eq!(plan.max_depth(), 2);
        assert_eq!(names(&plan, 1), vec!["b", "c"]);
        assert_eq!(names(&plan, 2), vec!["d", "d"]);

        plan.run();
        assert_eq!(d.runs.load(Ordering::SeqCst), 1);
        assert_eq!(a.runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn depth_follows_discovery_path_not_shortest_path() {
        // a -> b -> c and a -> c: c lands at depth 1 and depth 2.
        let c = node("c", &[]);
        let b = node("b", &[&c]);
        let a = node("a", &[&b, &c]);

        let plan = Plan::build(&(a as ActionRef), Arc::default());

        assert_eq!(names(&plan, 1), vec!["b", "c"]);
        assert_eq!(names(&plan, 2), vec!["c"]);

        let step = plan.step_run();
        assert_eq!(step.executed(), vec!["c", "b", "a"]);
        assert_eq!(step.skipped(), vec!["c"]);
    }

    #[test]
    fn halted_registry_stops_before_next_claim() {
        let c = node("c", &[]);
        let b = node("b", &[&c]);
        let a = node("a", &[&b]);

        let registry = Arc::new(ExecutionRegistry::new());
        registry.halt();
        let plan = Plan::build(&(a.clone() as ActionRef), Arc::clone(&registry));

        let step = plan.step_run();
        assert!(step.attempts.is_empty());
        assert_eq!(registry.claimed_count(), 0);
        assert_eq!(c.runs.load(Ordering::SeqCst), 0);
        assert_eq!(a.runs.load(Ordering::SeqCst), 0);
    }
}
