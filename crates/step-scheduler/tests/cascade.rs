use gridpilot_core_types::{ActionInstruction, ActionKind, TestPlan, TestState, TestStep};
use step_scheduler::{ScheduleError, StepScheduler};

fn step(n: u32) -> TestStep {
    TestStep::new(
        n,
        format!("step {n}"),
        ActionInstruction::new(ActionKind::Click, format!("click {n}"), "clicked"),
    )
}

/// Diamond: 1 -> {2, 3} -> 4, with a detached tail 5 depending on 4.
fn diamond_plan() -> (TestPlan, Vec<gridpilot_core_types::StepId>) {
    let mut plan = TestPlan::new("diamond", "cascade test", "https://example.test");
    let one = step(1);
    let two = step(2).with_dependency(one.id);
    let three = step(3).with_dependency(one.id);
    let four = step(4).with_dependency(two.id).with_dependency(three.id);
    let five = step(5).with_dependency(four.id);
    let ids = vec![one.id, two.id, three.id, four.id, five.id];
    for s in [one, two, three, four, five] {
        plan.push_step(s);
    }
    (plan, ids)
}

#[test]
fn cascade_covers_indirect_dependents() {
    let (plan, ids) = diamond_plan();
    let scheduler = StepScheduler::new(&plan).unwrap();
    let mut state = TestState::new(plan);

    state.mark_completed(ids[0]);
    state.mark_failed(ids[1]);
    let mut skipped = scheduler.cascade_failure(&mut state, ids[1]);
    skipped.sort_by_key(|id| {
        state
            .plan
            .step(*id)
            .map(|s| s.step_number)
            .unwrap_or(u32::MAX)
    });

    // 4 depends on 2 directly, 5 only through 4.
    assert_eq!(skipped, vec![ids[3], ids[4]]);

    // 3 only depends on 1 and still runs.
    assert_eq!(scheduler.next_runnable(&state).unwrap().id, ids[2]);
}

#[test]
fn skipped_steps_are_never_offered() {
    let (plan, ids) = diamond_plan();
    let scheduler = StepScheduler::new(&plan).unwrap();
    let mut state = TestState::new(plan);

    state.mark_failed(ids[0]);
    scheduler.cascade_failure(&mut state, ids[0]);

    assert!(scheduler.next_runnable(&state).is_none());
    assert_eq!(state.skipped_steps.len(), 4);
    assert!(state.completed_steps.is_empty());
}

#[test]
fn self_dependency_is_a_cycle() {
    let mut plan = TestPlan::new("t", "r", "https://example.test");
    let mut s = step(1);
    let id = s.id;
    s.dependencies.insert(id);
    plan.push_step(s);

    assert!(matches!(
        StepScheduler::new(&plan),
        Err(ScheduleError::CyclicDependency(_))
    ));
}

#[test]
fn duplicate_numbers_rejected() {
    let mut plan = TestPlan::new("t", "r", "https://example.test");
    plan.push_step(step(1));
    plan.push_step(step(1));
    assert!(matches!(
        StepScheduler::new(&plan),
        Err(ScheduleError::DuplicateStepNumber(1))
    ));
}
