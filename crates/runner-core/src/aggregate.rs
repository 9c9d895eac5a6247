//! Folding per-step outcomes into an overall run verdict.

use gridpilot_core_types::{TestState, TestStatus};
use serde::{Deserialize, Serialize};

/// Final counts and verdict for one run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// Deterministic overall status.
    pub status: TestStatus,

    /// Steps in the plan.
    pub total_steps: usize,

    /// Steps that completed.
    pub completed: usize,

    /// Steps that failed terminally.
    pub failed: usize,

    /// Steps skipped by the failure cascade.
    pub skipped: usize,

    /// Steps left without a terminal outcome.
    pub unresolved: usize,

    /// Errors across evaluations.
    pub error_count: u32,

    /// Warnings across evaluations.
    pub warning_count: u32,

    /// Run duration in milliseconds, when both timestamps are set.
    pub duration_ms: Option<u64>,
}

/// Fold the state's sets into the overall verdict.
///
/// Precedence: completed when every required step completed; failed when
/// any required step failed; blocked when unresolved steps remain (the
/// cascade left them unreachable); skipped when everything was skipped;
/// pending otherwise.
pub fn summarize(state: &TestState) -> RunSummary {
    let required: Vec<_> = state.plan.required_steps().collect();
    let all_required_completed = required
        .iter()
        .all(|id| state.completed_steps.contains(id));
    let any_required_failed = required.iter().any(|id| state.failed_steps.contains(id));

    let total_steps = state.plan.steps.len();
    let completed = state.completed_steps.len();
    let failed = state.failed_steps.len();
    let skipped = state.skipped_steps.len();
    let unresolved = total_steps - completed - failed - skipped;

    let status = if total_steps > 0 && all_required_completed {
        TestStatus::Completed
    } else if any_required_failed {
        TestStatus::Failed
    } else if unresolved > 0 && skipped > 0 {
        TestStatus::Blocked
    } else if skipped == total_steps && total_steps > 0 {
        TestStatus::Skipped
    } else {
        TestStatus::Pending
    };

    let duration_ms = match (state.started_at, state.ended_at) {
        (Some(start), Some(end)) => Some((end - start).num_milliseconds().max(0) as u64),
        _ => None,
    };

    RunSummary {
        status,
        total_steps,
        completed,
        failed,
        skipped,
        unresolved,
        error_count: state.error_count,
        warning_count: state.warning_count,
        duration_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridpilot_core_types::{ActionInstruction, ActionKind, TestPlan, TestStep};

    fn plan(optional_mask: &[bool]) -> TestPlan {
        let mut plan = TestPlan::new("t", "r", "https://example.test");
        for (i, optional) in optional_mask.iter().enumerate() {
            let n = (i + 1) as u32;
            plan.push_step(
                TestStep::new(
                    n,
                    format!("step {n}"),
                    ActionInstruction::new(ActionKind::Click, format!("click {n}"), "clicked"),
                )
                .with_optional(*optional),
            );
        }
        plan
    }

    #[test]
    fn all_required_completed_is_completed() {
        let plan = plan(&[false, true]);
        let required = plan.steps[0].id;
        let optional = plan.steps[1].id;
        let mut state = TestState::new(plan);
        state.mark_completed(required);
        state.mark_failed(optional);

        let summary = summarize(&state);
        assert_eq!(summary.status, TestStatus::Completed);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn required_failure_is_failed() {
        let plan = plan(&[false, false]);
        let first = plan.steps[0].id;
        let second = plan.steps[1].id;
        let mut state = TestState::new(plan);
        state.mark_failed(first);
        state.mark_skipped(second);

        assert_eq!(summarize(&state).status, TestStatus::Failed);
    }

    #[test]
    fn unresolved_with_skips_is_blocked() {
        let plan = plan(&[true, false, false]);
        let optional = plan.steps[0].id;
        let second = plan.steps[1].id;
        let mut state = TestState::new(plan);
        // An optional step failed, one dependent got skipped elsewhere,
        // one step never ran.
        state.mark_failed(optional);
        state.mark_skipped(second);

        assert_eq!(summarize(&state).status, TestStatus::Blocked);
    }

    #[test]
    fn untouched_plan_is_pending() {
        let state = TestState::new(plan(&[false]));
        assert_eq!(summarize(&state).status, TestStatus::Pending);
    }
}
