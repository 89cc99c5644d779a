// src/dag/mod.rs

//! Action graphs and per-root execution plans.
//!
//! - [`action`] defines the [`Action`] trait and reference identity.
//! - [`plan`] expands one root into depth levels and runs them deepest-first.
//! - [`registry`] is the exactly-once claim set shared by all plans of a pool.
//! - [`plan_step`] defines the result type for manually stepped plans.

pub mod action;
pub mod plan;
pub mod plan_step;
pub mod registry;

pub use action::{Action, ActionId, ActionRef};
pub use plan::Plan;
pub use plan_step::{ClaimAttempt, PlanStep};
pub use registry::ExecutionRegistry;
