// src/dag/action.rs

//! The unit of schedulable work.

use std::fmt;
use std::sync::Arc;

/// Shared handle to an action.
///
/// The same logical pass reached through two dependency paths must be the
/// *same* `Arc`, not a copy: identity is the allocation, see [`ActionId`].
pub type ActionRef = Arc<dyn Action>;

/// A schedulable pass: a synchronous routine plus its direct dependencies.
///
/// Implementations decide what `exec` does and how its failures surface.
/// The scheduler only guarantees that `exec` is invoked at most once per
/// action per pool, and that it is never invoked for an action the scheduler
/// cannot reach from a root.
pub trait Action: Send + Sync {
    /// Human-readable name, used in logs and claim traces.
    fn name(&self) -> &str;

    /// Direct dependencies, in declaration order.
    fn deps(&self) -> &[ActionRef];

    /// Run the action. Panics are not caught by the scheduler.
    fn exec(&self);
}

impl fmt::Debug for dyn Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name())
            .field("deps", &self.deps().len())
            .finish()
    }
}

/// Reference identity of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(usize);

impl ActionId {
    pub fn of(action: &ActionRef) -> Self {
        // Thin pointer to the shared allocation; the vtable half is ignored
        // so that two `ActionRef`s to the same value always compare equal.
        Self(Arc::as_ptr(action) as *const () as usize)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
