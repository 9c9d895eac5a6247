//! Deterministic collaborators for tests and rehearsal runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use gridpilot_core_types::{
    ActionInstruction, EvaluationResult, ScrollDirection, TestStep,
};

use crate::errors::RunnerError;
use crate::executor::{ActionExecutor, ExecutionReport, ResolvedAction};
use crate::oracle::RunnerOracle;
use scroll_control::{ScrollError, ScrollSurface};

/// One scripted evaluation verdict.
#[derive(Clone, Debug)]
pub struct ScriptedEvaluation {
    pub success: bool,
    pub actual_outcome: String,
    pub deviations: Vec<String>,
    pub extracted_values: HashMap<String, serde_json::Value>,
}

impl ScriptedEvaluation {
    /// Passing verdict echoing the expected outcome.
    pub fn pass() -> Self {
        Self {
            success: true,
            actual_outcome: String::new(),
            deviations: Vec::new(),
            extracted_values: HashMap::new(),
        }
    }

    /// Failing verdict with one deviation.
    pub fn fail(deviation: impl Into<String>) -> Self {
        let deviation = deviation.into();
        Self {
            success: false,
            actual_outcome: deviation.clone(),
            deviations: vec![deviation],
            extracted_values: HashMap::new(),
        }
    }

    /// Attach an extracted value.
    pub fn with_extracted(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extracted_values.insert(key.into(), value);
        self
    }
}

/// Runner oracle that confirms instructions verbatim and replays
/// scripted evaluations in order (the last one repeats).
#[derive(Debug, Default)]
pub struct ScriptedRunnerOracle {
    evaluations: Mutex<Vec<ScriptedEvaluation>>,
    confirm_calls: AtomicUsize,
    evaluate_calls: AtomicUsize,
}

impl ScriptedRunnerOracle {
    /// Oracle that passes every evaluation.
    pub fn passing() -> Self {
        Self::with_evaluations(vec![ScriptedEvaluation::pass()])
    }

    /// Oracle with a fixed evaluation script.
    pub fn with_evaluations(evaluations: Vec<ScriptedEvaluation>) -> Self {
        Self {
            evaluations: Mutex::new(evaluations),
            confirm_calls: AtomicUsize::new(0),
            evaluate_calls: AtomicUsize::new(0),
        }
    }

    pub fn confirm_calls(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }

    pub fn evaluate_calls(&self) -> usize {
        self.evaluate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RunnerOracle for ScriptedRunnerOracle {
    async fn confirm_instruction(
        &self,
        step: &TestStep,
        _context: &HashMap<String, serde_json::Value>,
    ) -> Result<ActionInstruction, RunnerError> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        Ok(step.instruction.clone())
    }

    async fn evaluate(
        &self,
        step: &TestStep,
        instruction: &ActionInstruction,
        _report: &ExecutionReport,
    ) -> Result<EvaluationResult, RunnerError> {
        let index = self.evaluate_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.evaluations.lock().expect("evaluation lock");
        let scripted = if script.is_empty() {
            ScriptedEvaluation::pass()
        } else {
            script[index.min(script.len() - 1)].clone()
        };

        let actual = if scripted.actual_outcome.is_empty() {
            instruction.expected_outcome.clone()
        } else {
            scripted.actual_outcome.clone()
        };
        let mut evaluation = if scripted.success {
            EvaluationResult::passed(step.id, 0.95, instruction.expected_outcome.clone(), actual)
        } else {
            EvaluationResult::failed(
                step.id,
                0.9,
                instruction.expected_outcome.clone(),
                actual,
                scripted.deviations.clone(),
            )
        };
        evaluation.extracted_values = scripted.extracted_values.clone();
        Ok(evaluation)
    }
}

/// In-process executor for rehearsal runs and tests.
///
/// Interactions always succeed (unless `fail_actions` is set), gestures
/// are recorded, and release calls are counted so tests can assert the
/// exactly-once guarantee.
#[derive(Debug, Default)]
pub struct SimulatedExecutor {
    executed: Mutex<Vec<ResolvedAction>>,
    gestures: Mutex<Vec<(ScrollDirection, u32)>>,
    release_count: AtomicUsize,
    fail_actions: AtomicBool,
    viewport: (u32, u32),
}

impl SimulatedExecutor {
    pub fn new() -> Self {
        Self {
            viewport: (1280, 720),
            ..Default::default()
        }
    }

    /// Make every subsequent interaction report failure.
    pub fn fail_actions(&self, fail: bool) {
        self.fail_actions.store(fail, Ordering::SeqCst);
    }

    /// Actions executed so far.
    pub fn executions(&self) -> Vec<ResolvedAction> {
        self.executed.lock().expect("execution lock").clone()
    }

    /// Number of actions executed so far.
    pub fn execution_count(&self) -> usize {
        self.executed.lock().expect("execution lock").len()
    }

    /// How many times the session was released.
    pub fn release_count(&self) -> usize {
        self.release_count.load(Ordering::SeqCst)
    }

    fn replay_command(&self, action: &ResolvedAction) -> Option<String> {
        let coord = action.coordinate.as_ref()?;
        let (x, y) = coord.to_pixels(self.viewport.0, self.viewport.1);
        Some(match action.instruction.kind.name() {
            "type" => format!(
                "type({x}, {y}, {:?})",
                action.instruction.value.as_deref().unwrap_or_default()
            ),
            kind => format!("{kind}({x}, {y})"),
        })
    }
}

#[async_trait]
impl ActionExecutor for SimulatedExecutor {
    async fn execute(&self, action: &ResolvedAction) -> Result<ExecutionReport, RunnerError> {
        self.executed
            .lock()
            .expect("execution lock")
            .push(action.clone());

        if self.fail_actions.load(Ordering::SeqCst) {
            return Ok(ExecutionReport {
                success: false,
                duration_ms: 3,
                error: Some("simulated interaction failure".to_string()),
                screenshot_before: None,
                screenshot_after: None,
                replay_command: None,
            });
        }

        Ok(ExecutionReport {
            success: true,
            duration_ms: 5,
            error: None,
            screenshot_before: None,
            screenshot_after: None,
            replay_command: self.replay_command(action),
        })
    }

    async fn release(&self) {
        self.release_count.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ScrollSurface for SimulatedExecutor {
    async fn scroll_by(&self, direction: ScrollDirection, pixels: u32) -> Result<(), ScrollError> {
        self.gestures
            .lock()
            .expect("gesture lock")
            .push((direction, pixels));
        Ok(())
    }
}
