// src/dag/plan_step.rs

//! Step-by-step execution result types for a plan.

/// One claim attempt made while running a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimAttempt {
    /// Name of the action whose claim was attempted.
    pub action: String,
    /// Depth of the entry in the plan (0 = root).
    pub depth: usize,
    /// Whether this attempt won the claim and executed the action.
    pub claimed: bool,
}

/// Structured result of running one plan through [`Plan::step_run`].
///
/// Useful for tests that want to assert on claim ordering and on which
/// plan lost a race for a shared dependency.
///
/// [`Plan::step_run`]: crate::dag::Plan::step_run
#[derive(Debug, Clone, Default)]
pub struct PlanStep {
    /// Claim attempts in the order they were made.
    pub attempts: Vec<ClaimAttempt>,
}

impl PlanStep {
    /// Names of actions this plan actually executed, in order.
    pub fn executed(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter(|a| a.claimed)
            .map(|a| a.action.as_str())
            .collect()
    }

    /// Names of actions this plan found already claimed, in order.
    pub fn skipped(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .filter(|a| !a.claimed)
            .map(|a| a.action.as_str())
            .collect()
    }

    /// Position of the first attempt on `action`, if any.
    pub fn first_attempt_of(&self, action: &str) -> Option<usize> {
        self.attempts.iter().position(|a| a.action == action)
    }
}
