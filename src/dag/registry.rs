// src/dag/registry.rs

//! Exactly-once claim registry shared by every plan in a pool.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashSet;

use crate::dag::action::{ActionId, ActionRef};

/// Records which actions have been claimed for execution.
///
/// A claim marks *initiation*, not completion: once `claim` returns `true`
/// for an action, every later claim on it returns `false`, even while the
/// winning caller is still inside `exec`.
///
/// Once halted, plans sharing the registry stop before their next claim.
#[derive(Debug, Default)]
pub struct ExecutionRegistry {
    claimed: DashSet<ActionId>,
    halted: AtomicBool,
}

impl ExecutionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to claim `action`. Returns `true` for exactly one caller per action.
    pub fn claim(&self, action: &ActionRef) -> bool {
        self.claimed.insert(ActionId::of(action))
    }

    pub fn is_claimed(&self, action: &ActionRef) -> bool {
        self.claimed.contains(&ActionId::of(action))
    }

    /// Number of distinct actions claimed so far.
    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }

    /// Stop every plan using this registry before its next claim.
    pub fn halt(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::dag::action::Action;

    struct Leaf;

    impl Action for Leaf {
        fn name(&self) -> &str {
            "leaf"
        }

        fn deps(&self) -> &[ActionRef] {
            &[]
        }

        fn exec(&self) {}
    }

    #[test]
    fn second_claim_fails() {
        let registry = ExecutionRegistry::new();
        let leaf: ActionRef = Arc::new(Leaf);

        assert!(!registry.is_claimed(&leaf));
        assert!(registry.claim(&leaf));
        assert!(!registry.claim(&leaf));
        assert!(registry.is_claimed(&leaf));
        assert_eq!(registry.claimed_count(), 1);
    }

    #[test]
    fn halt_is_sticky_and_leaves_claims_alone() {
        let registry = ExecutionRegistry::new();
        let leaf: ActionRef = Arc::new(Leaf);
        assert!(registry.claim(&leaf));

        assert!(!registry.is_halted());
        registry.halt();
        registry.halt();
        assert!(registry.is_halted());
        assert!(registry.is_claimed(&leaf));
        assert_eq!(registry.claimed_count(), 1);
    }

    #[test]
    fn concurrent_claims_have_a_single_winner() {
        let registry = ExecutionRegistry::new();
        let leaf: ActionRef = Arc::new(Leaf);
        let winners = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| {
                    if registry.claim(&leaf) {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }
}
