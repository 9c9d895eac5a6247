//! Runnable-step selection and failure cascade.

use gridpilot_core_types::{StepId, TestPlan, TestState, TestStep};
use tracing::{debug, info};

use crate::errors::ScheduleError;
use crate::graph::DependencyGraph;

/// Scheduler over one validated plan.
///
/// Holds the dependency graph and answers two questions for the
/// coordinator: which step runs next, and what must be skipped when a
/// required step fails terminally.
#[derive(Debug)]
pub struct StepScheduler {
    graph: DependencyGraph,
    /// Step ids ordered by ascending step number.
    order: Vec<StepId>,
}

impl StepScheduler {
    /// Validate the plan and build a scheduler for it.
    pub fn new(plan: &TestPlan) -> Result<Self, ScheduleError> {
        let graph = DependencyGraph::build(plan)?;
        let mut order: Vec<(u32, StepId)> = plan
            .steps
            .iter()
            .map(|s| (s.step_number, s.id))
            .collect();
        order.sort_unstable_by_key(|(number, _)| *number);
        Ok(Self {
            graph,
            order: order.into_iter().map(|(_, id)| id).collect(),
        })
    }

    /// The next runnable step, lowest step number first.
    ///
    /// A step is runnable when it has no terminal outcome yet and every
    /// declared dependency is satisfied: completed, or failed but declared
    /// optional (an optional failure never blocks its dependents).
    pub fn next_runnable<'a>(&self, state: &'a TestState) -> Option<&'a TestStep> {
        for id in &self.order {
            if state.is_terminal(*id) {
                continue;
            }
            let step = state.plan.step(*id)?;
            if self.dependencies_satisfied(state, step) {
                debug!(step = step.step_number, "next runnable step");
                return Some(step);
            }
        }
        None
    }

    fn dependencies_satisfied(&self, state: &TestState, step: &TestStep) -> bool {
        step.dependencies.iter().all(|dep| {
            state.completed_steps.contains(dep)
                || (state.failed_steps.contains(dep)
                    && state.plan.step(*dep).map(|s| s.optional).unwrap_or(false))
        })
    }

    /// Whether every unresolved step is merely waiting on unresolved
    /// dependencies (as opposed to being permanently unrunnable).
    ///
    /// Once `next_runnable` returns `None`, anything unresolved is
    /// unreachable; the caller decides between blocked and cycle reporting.
    pub fn has_unresolved(&self, state: &TestState) -> bool {
        !state.unresolved_steps().is_empty()
    }

    /// Apply the failure cascade for a terminally failed step.
    ///
    /// For a required step, every transitive dependent is blocked and
    /// recorded as skipped without execution. For an optional step the
    /// failure is recorded but dependents are left alone.
    pub fn cascade_failure(&self, state: &mut TestState, failed: StepId) -> Vec<StepId> {
        let optional = state
            .plan
            .step(failed)
            .map(|s| s.optional)
            .unwrap_or(false);
        if optional {
            debug!(%failed, "optional step failed; dependents unaffected");
            return Vec::new();
        }

        let mut skipped: Vec<StepId> = Vec::new();
        for dependent in self.graph.transitive_dependents(failed) {
            if !state.is_terminal(dependent) {
                state.mark_skipped(dependent);
                skipped.push(dependent);
            }
        }
        if !skipped.is_empty() {
            let numbers: Vec<u32> = skipped
                .iter()
                .filter_map(|id| state.plan.step(*id).map(|s| s.step_number))
                .collect();
            info!(?numbers, "skipping dependents of failed required step");
        }
        skipped
    }

    /// The underlying dependency graph.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridpilot_core_types::{ActionInstruction, ActionKind, TestStep};

    fn step(n: u32) -> TestStep {
        TestStep::new(
            n,
            format!("step {n}"),
            ActionInstruction::new(ActionKind::Click, format!("click {n}"), "clicked"),
        )
    }

    fn three_step_plan() -> (TestPlan, [StepId; 3]) {
        // 1 and 2 are roots; 3 depends on both.
        let mut plan = TestPlan::new("t", "r", "https://example.test");
        let one = step(1);
        let two = step(2);
        let three = step(3).with_dependency(one.id).with_dependency(two.id);
        let ids = [one.id, two.id, three.id];
        plan.push_step(one);
        plan.push_step(two);
        plan.push_step(three);
        (plan, ids)
    }

    #[test]
    fn roots_run_in_plan_order() {
        let (plan, ids) = three_step_plan();
        let scheduler = StepScheduler::new(&plan).unwrap();
        let state = TestState::new(plan);
        assert_eq!(scheduler.next_runnable(&state).unwrap().id, ids[0]);
    }

    #[test]
    fn dependent_waits_for_all_dependencies() {
        let (plan, ids) = three_step_plan();
        let scheduler = StepScheduler::new(&plan).unwrap();
        let mut state = TestState::new(plan);

        state.mark_completed(ids[0]);
        assert_eq!(scheduler.next_runnable(&state).unwrap().id, ids[1]);

        state.mark_completed(ids[1]);
        assert_eq!(scheduler.next_runnable(&state).unwrap().id, ids[2]);
    }

    #[test]
    fn required_failure_cascades_to_dependents() {
        let (plan, ids) = three_step_plan();
        let scheduler = StepScheduler::new(&plan).unwrap();
        let mut state = TestState::new(plan);

        state.mark_failed(ids[0]);
        let skipped = scheduler.cascade_failure(&mut state, ids[0]);
        assert_eq!(skipped, vec![ids[2]]);
        assert!(state.skipped_steps.contains(&ids[2]));

        // Step 2 is unaffected; step 3 is terminal.
        state.mark_completed(ids[1]);
        assert!(scheduler.next_runnable(&state).is_none());
    }

    #[test]
    fn optional_failure_does_not_block() {
        let mut plan = TestPlan::new("t", "r", "https://example.test");
        let root = step(1).with_optional(true);
        let dependent = step(2).with_dependency(root.id);
        let (root_id, dep_id) = (root.id, dependent.id);
        plan.push_step(root);
        plan.push_step(dependent);

        let scheduler = StepScheduler::new(&plan).unwrap();
        let mut state = TestState::new(plan);

        state.mark_failed(root_id);
        assert!(scheduler.cascade_failure(&mut state, root_id).is_empty());
        assert_eq!(scheduler.next_runnable(&state).unwrap().id, dep_id);
    }
}
