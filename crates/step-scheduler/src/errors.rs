//! Scheduling error types.

use gridpilot_core_types::StepId;
use thiserror::Error;

/// Errors raised while validating or scheduling a plan.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The dependency graph contains a cycle; no execution order exists.
    #[error("cyclic dependency among steps {0:?}")]
    CyclicDependency(Vec<u32>),

    /// A step references a dependency that is not part of the plan.
    #[error("step {step_number} depends on unknown step {dependency}")]
    UnknownDependency { step_number: u32, dependency: StepId },

    /// Two steps share the same ordinal.
    #[error("duplicate step number {0}")]
    DuplicateStepNumber(u32),

    /// The plan has no steps.
    #[error("plan contains no steps")]
    EmptyPlan,
}
