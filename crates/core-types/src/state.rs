//! Mutable state of one test run.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::TestPlan;
use crate::StepId;

/// Overall status of a test execution.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
    Blocked,
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TestStatus::Pending => "pending",
            TestStatus::InProgress => "in_progress",
            TestStatus::Completed => "completed",
            TestStatus::Failed => "failed",
            TestStatus::Skipped => "skipped",
            TestStatus::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

/// State of a single run over one plan.
///
/// Mutated exclusively by the execution coordinator; the completed, failed
/// and skipped sets stay pairwise disjoint by construction (a step moves
/// into exactly one terminal set, once).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestState {
    /// The plan being executed.
    pub plan: TestPlan,

    /// Step currently executing, if any.
    pub current_step: Option<StepId>,

    /// Steps that completed successfully.
    pub completed_steps: HashSet<StepId>,

    /// Steps that failed terminally (retries exhausted).
    pub failed_steps: HashSet<StepId>,

    /// Steps skipped because a required dependency failed.
    pub skipped_steps: HashSet<StepId>,

    /// Overall run status.
    pub status: TestStatus,

    /// Run start time, set when the first step begins.
    pub started_at: Option<DateTime<Utc>>,

    /// Run end time, set when the run terminates.
    pub ended_at: Option<DateTime<Utc>>,

    /// Errors observed across evaluations.
    pub error_count: u32,

    /// Warnings observed across evaluations.
    pub warning_count: u32,

    /// Cross-step values extracted by evaluations, keyed by name.
    pub context: HashMap<String, serde_json::Value>,
}

impl TestState {
    /// Fresh state for a plan, nothing executed yet.
    pub fn new(plan: TestPlan) -> Self {
        Self {
            plan,
            current_step: None,
            completed_steps: HashSet::new(),
            failed_steps: HashSet::new(),
            skipped_steps: HashSet::new(),
            status: TestStatus::Pending,
            started_at: None,
            ended_at: None,
            error_count: 0,
            warning_count: 0,
            context: HashMap::new(),
        }
    }

    /// Whether the step has reached a terminal outcome.
    pub fn is_terminal(&self, id: StepId) -> bool {
        self.completed_steps.contains(&id)
            || self.failed_steps.contains(&id)
            || self.skipped_steps.contains(&id)
    }

    /// Record a successful step. No-op if the step is already terminal.
    pub fn mark_completed(&mut self, id: StepId) {
        if !self.is_terminal(id) {
            self.completed_steps.insert(id);
        }
    }

    /// Record a terminal failure. No-op if the step is already terminal.
    pub fn mark_failed(&mut self, id: StepId) {
        if !self.is_terminal(id) {
            self.failed_steps.insert(id);
        }
    }

    /// Record a cascade skip. No-op if the step is already terminal.
    pub fn mark_skipped(&mut self, id: StepId) {
        if !self.is_terminal(id) {
            self.skipped_steps.insert(id);
        }
    }

    /// Steps that have not reached a terminal outcome yet.
    pub fn unresolved_steps(&self) -> Vec<StepId> {
        self.plan
            .steps
            .iter()
            .map(|s| s.id)
            .filter(|id| !self.is_terminal(*id))
            .collect()
    }

    /// Merge extracted values into the cross-step context.
    pub fn merge_context(&mut self, values: &HashMap<String, serde_json::Value>) {
        for (key, value) in values {
            self.context.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionInstruction, ActionKind};
    use crate::plan::TestStep;

    fn plan_with_one_step() -> TestPlan {
        let mut plan = TestPlan::new("t", "r", "https://example.test");
        plan.push_step(TestStep::new(
            1,
            "step",
            ActionInstruction::new(ActionKind::Click, "click", "clicked"),
        ));
        plan
    }

    #[test]
    fn terminal_sets_stay_disjoint() {
        let plan = plan_with_one_step();
        let id = plan.steps[0].id;
        let mut state = TestState::new(plan);

        state.mark_completed(id);
        state.mark_failed(id);
        state.mark_skipped(id);

        assert!(state.completed_steps.contains(&id));
        assert!(state.failed_steps.is_empty());
        assert!(state.skipped_steps.is_empty());
    }

    #[test]
    fn unresolved_until_terminal() {
        let plan = plan_with_one_step();
        let id = plan.steps[0].id;
        let mut state = TestState::new(plan);
        assert_eq!(state.unresolved_steps(), vec![id]);
        state.mark_failed(id);
        assert!(state.unresolved_steps().is_empty());
    }
}
