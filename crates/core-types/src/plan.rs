//! Test plans and steps.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::ActionInstruction;
use crate::{PlanId, StepId};

/// A single step in a test plan. Immutable once the plan is created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestStep {
    /// Step identity, referenced by dependents.
    pub id: StepId,

    /// 1-based ordinal within the plan; also the tie-breaker among
    /// simultaneously runnable steps.
    pub step_number: u32,

    /// What this step verifies, in tester language.
    pub description: String,

    /// The action to perform.
    pub instruction: ActionInstruction,

    /// Steps that must complete before this one may run.
    #[serde(default)]
    pub dependencies: HashSet<StepId>,

    /// Optional steps may fail without blocking their dependents.
    #[serde(default)]
    pub optional: bool,

    /// Retry budget after the first failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    3
}

impl TestStep {
    /// Create a step with a fresh identity and default retry budget.
    pub fn new(step_number: u32, description: impl Into<String>, instruction: ActionInstruction) -> Self {
        Self {
            id: StepId::new(),
            step_number,
            description: description.into(),
            instruction,
            dependencies: HashSet::new(),
            optional: false,
            max_retries: default_max_retries(),
        }
    }

    /// Declare a dependency on another step.
    pub fn with_dependency(mut self, dep: StepId) -> Self {
        self.dependencies.insert(dep);
        self
    }

    /// Mark the step optional.
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Set the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// A complete test plan produced by the planning collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestPlan {
    /// Plan identity.
    pub id: PlanId,

    /// Short plan name.
    pub name: String,

    /// Original free-text requirements the plan was derived from.
    pub requirements: String,

    /// Entry URL the run starts from.
    pub url: String,

    /// Ordered steps; order matches `step_number`.
    pub steps: Vec<TestStep>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Free-form labels.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TestPlan {
    /// Create an empty plan.
    pub fn new(
        name: impl Into<String>,
        requirements: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: PlanId::new(),
            name: name.into(),
            requirements: requirements.into(),
            url: url.into(),
            steps: Vec::new(),
            created_at: Utc::now(),
            tags: Vec::new(),
        }
    }

    /// Append a step, keeping steps sorted by ordinal.
    pub fn push_step(&mut self, step: TestStep) {
        self.steps.push(step);
        self.steps.sort_by_key(|s| s.step_number);
    }

    /// Look up a step by identity.
    pub fn step(&self, id: StepId) -> Option<&TestStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Look up a step by ordinal.
    pub fn step_by_number(&self, number: u32) -> Option<&TestStep> {
        self.steps.iter().find(|s| s.step_number == number)
    }

    /// Identities of all steps that are not optional.
    pub fn required_steps(&self) -> impl Iterator<Item = StepId> + '_ {
        self.steps.iter().filter(|s| !s.optional).map(|s| s.id)
    }
}
