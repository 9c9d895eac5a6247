//! Dependency graph over the steps of one plan.

use std::collections::{HashMap, HashSet, VecDeque};

use gridpilot_core_types::{StepId, TestPlan};

use crate::errors::ScheduleError;

/// Directed acyclic graph encoding required-before relationships.
///
/// Edges point from a dependency to its dependents, so walking forward
/// from a failed step yields everything that must be skipped.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Dependency -> direct dependents.
    dependents: HashMap<StepId, Vec<StepId>>,

    /// Step -> its declared dependencies.
    dependencies: HashMap<StepId, HashSet<StepId>>,

    /// Step -> ordinal, for diagnostics and tie-breaking.
    numbers: HashMap<StepId, u32>,
}

impl DependencyGraph {
    /// Build and validate the graph for a plan.
    ///
    /// Rejects empty plans, duplicate ordinals, unknown dependency ids and
    /// cycles. A validated graph guarantees some execution order exists.
    pub fn build(plan: &TestPlan) -> Result<Self, ScheduleError> {
        if plan.steps.is_empty() {
            return Err(ScheduleError::EmptyPlan);
        }

        let mut numbers = HashMap::new();
        let mut seen_numbers = HashSet::new();
        for step in &plan.steps {
            if !seen_numbers.insert(step.step_number) {
                return Err(ScheduleError::DuplicateStepNumber(step.step_number));
            }
            numbers.insert(step.id, step.step_number);
        }

        let known: HashSet<StepId> = plan.steps.iter().map(|s| s.id).collect();
        let mut dependents: HashMap<StepId, Vec<StepId>> = HashMap::new();
        let mut dependencies: HashMap<StepId, HashSet<StepId>> = HashMap::new();
        for step in &plan.steps {
            for dep in &step.dependencies {
                if !known.contains(dep) {
                    return Err(ScheduleError::UnknownDependency {
                        step_number: step.step_number,
                        dependency: *dep,
                    });
                }
                dependents.entry(*dep).or_default().push(step.id);
            }
            dependencies.insert(step.id, step.dependencies.clone());
        }

        let graph = Self {
            dependents,
            dependencies,
            numbers,
        };
        graph.check_acyclic()?;
        Ok(graph)
    }

    /// Declared dependencies of a step.
    pub fn dependencies_of(&self, id: StepId) -> impl Iterator<Item = StepId> + '_ {
        self.dependencies.get(&id).into_iter().flatten().copied()
    }

    /// Every step reachable from `id` along dependency edges.
    pub fn transitive_dependents(&self, id: StepId) -> HashSet<StepId> {
        let mut reached = HashSet::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if let Some(children) = self.dependents.get(&current) {
                for child in children {
                    if reached.insert(*child) {
                        queue.push_back(*child);
                    }
                }
            }
        }
        reached
    }

    /// Kahn's algorithm; an unconsumed remainder is a cycle.
    fn check_acyclic(&self) -> Result<(), ScheduleError> {
        let mut in_degree: HashMap<StepId, usize> = self
            .dependencies
            .iter()
            .map(|(id, deps)| (*id, deps.len()))
            .collect();

        let mut queue: VecDeque<StepId> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut resolved = 0usize;
        while let Some(id) = queue.pop_front() {
            resolved += 1;
            if let Some(children) = self.dependents.get(&id) {
                for child in children {
                    let deg = in_degree
                        .get_mut(child)
                        .expect("dependent is a known step");
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(*child);
                    }
                }
            }
        }

        if resolved == self.dependencies.len() {
            Ok(())
        } else {
            let mut stuck: Vec<u32> = in_degree
                .iter()
                .filter(|(_, deg)| **deg > 0)
                .filter_map(|(id, _)| self.numbers.get(id).copied())
                .collect();
            stuck.sort_unstable();
            Err(ScheduleError::CyclicDependency(stuck))
        }
    }
}
