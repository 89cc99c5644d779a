// src/pool/mod.rs

//! Fixed-size worker pool that runs one [`Plan`](crate::dag::Plan) per root.
//!
//! The pool lifecycle is `Created -> Running -> Draining -> Disposed`:
//! - [`ExecPool::new`] builds and enqueues every plan up front.
//! - [`ExecPool::start`] spawns the workers (first call only).
//! - [`ExecPool::dispose_and_wait`] waits for every plan, closes the queue
//!   and joins the workers (first call only).
//!
//! A panicking pass halts the shared registry: the other plans stop before
//! their next claim, the workers are joined, and only then does the panic
//! resume out of `dispose_and_wait`.
//!
//! Concurrency is across roots only. A plan runs start to finish on one
//! worker, and workers never wait for each other: if two plans share a
//! dependency, the plan that loses the claim moves on immediately, possibly
//! before the winner has finished executing it.

pub mod executor;
pub mod pending;

pub use executor::ExecPool;
pub use pending::{Drained, PendingPlans};

/// Lifecycle state of an [`ExecPool`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Plans are queued; no workers yet.
    Created,
    /// Workers have been spawned.
    Running,
    /// `dispose_and_wait` is waiting for outstanding plans.
    Draining,
    /// Queue closed and workers joined, whether the drain completed or a
    /// pass panicked. Terminal.
    Disposed,
}
