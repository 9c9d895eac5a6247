//! The execution coordinator: one step at a time, retries, auditing.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gridpilot_core_types::{
    ActionInstruction, ActionKind, EvaluationResult, GridCoordinate, JournalEntry, TestPlan,
    TestState, TestStatus, TestStep,
};
use grid_locator::{LocatorError, VisualLocator};
use scroll_control::ScrollController;
use step_scheduler::StepScheduler;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregate::{summarize, RunSummary};
use crate::config::RunnerConfig;
use crate::errors::RunnerError;
use crate::executor::{ActionExecutor, ExecutionReport, ResolvedAction};
use crate::journal::ExecutionJournal;
use crate::oracle::RunnerOracle;

/// Everything a finished run hands back to reporting.
#[derive(Debug)]
pub struct RunReport {
    /// Final state, terminal sets filled in.
    pub state: TestState,

    /// Folded verdict and counters.
    pub summary: RunSummary,

    /// Append-only audit journal.
    pub journal: ExecutionJournal,
}

/// One executed attempt that made it through evaluation.
#[derive(Debug)]
struct StepAttempt {
    instruction: ActionInstruction,
    coordinate: Option<GridCoordinate>,
    scroll_attempts: Option<u32>,
    report: ExecutionReport,
    evaluation: EvaluationResult,
}

/// Terminal verdict for one step after the retry budget.
#[derive(Debug)]
struct StepVerdict {
    success: bool,
    attempt: Option<StepAttempt>,
    retries: u32,
    error: Option<String>,
}

/// Drives a plan against the external collaborators.
///
/// Execution is strictly serialized: the browser session is a single
/// exclusively-owned resource, so exactly one step (and within it one
/// oracle or executor call) is in flight at any time.
pub struct ExecutionCoordinator {
    oracle: Arc<dyn RunnerOracle>,
    locator: Arc<dyn VisualLocator>,
    scroller: ScrollController,
    executor: Arc<dyn ActionExecutor>,
    config: RunnerConfig,
}

impl ExecutionCoordinator {
    pub fn new(
        oracle: Arc<dyn RunnerOracle>,
        locator: Arc<dyn VisualLocator>,
        scroller: ScrollController,
        executor: Arc<dyn ActionExecutor>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            oracle,
            locator,
            scroller,
            executor,
            config,
        }
    }

    /// Execute a plan to completion, timeout or cancellation.
    ///
    /// The executor's session is released exactly once on every exit
    /// path: normal completion, validation failure after start, run
    /// timeout and cancellation.
    pub async fn run(
        &self,
        plan: TestPlan,
        cancel: CancellationToken,
    ) -> Result<RunReport, RunnerError> {
        let scheduler = match StepScheduler::new(&plan) {
            Ok(scheduler) => scheduler,
            Err(err) => {
                // Nothing ran, but the session was handed to us.
                self.executor.release().await;
                return Err(err.into());
            }
        };

        let mut state = TestState::new(plan);
        let mut journal = ExecutionJournal::new();
        state.status = TestStatus::InProgress;
        state.started_at = Some(Utc::now());

        // Biased so cancellation always wins over a step that happens to
        // finish in the same poll.
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(RunnerError::Cancelled),
            driven = timeout(
                self.config.run_timeout,
                self.drive(&scheduler, &mut state, &mut journal),
            ) => match driven {
                Ok(inner) => inner,
                Err(_) => Err(RunnerError::RunTimeout(self.config.run_timeout)),
            },
        };

        self.executor.release().await;
        state.ended_at = Some(Utc::now());
        state.current_step = None;

        outcome?;
        let summary = summarize(&state);
        state.status = summary.status;
        info!(status = %summary.status, completed = summary.completed, failed = summary.failed, "run finished");
        Ok(RunReport {
            state,
            summary,
            journal,
        })
    }

    /// Main loop: pull runnable steps from the scheduler until none remain.
    async fn drive(
        &self,
        scheduler: &StepScheduler,
        state: &mut TestState,
        journal: &mut ExecutionJournal,
    ) -> Result<(), RunnerError> {
        while let Some(step) = scheduler.next_runnable(state).cloned() {
            state.current_step = Some(step.id);
            info!(step = step.step_number, description = %step.description, "executing step");

            let verdict = self.run_step(&step, state).await?;
            journal.append(self.journal_entry(&step, &verdict));

            if verdict.success {
                if let Some(attempt) = &verdict.attempt {
                    state.merge_context(&attempt.evaluation.extracted_values);
                    state.warning_count += attempt.evaluation.deviations.len() as u32;
                }
                state.mark_completed(step.id);
            } else {
                match &verdict.attempt {
                    Some(attempt) => {
                        state.error_count += attempt.evaluation.deviations.len().max(1) as u32;
                    }
                    None => state.error_count += 1,
                }
                state.mark_failed(step.id);
                scheduler.cascade_failure(state, step.id);
            }
        }
        Ok(())
    }

    /// Run one step through its retry budget.
    async fn run_step(
        &self,
        step: &TestStep,
        state: &TestState,
    ) -> Result<StepVerdict, RunnerError> {
        let mut retries = 0u32;
        loop {
            match self.attempt_step(step, state).await {
                Ok(attempt) if attempt.evaluation.success => {
                    return Ok(StepVerdict {
                        success: true,
                        attempt: Some(attempt),
                        retries,
                        error: None,
                    });
                }
                Ok(attempt) => {
                    if retries < step.max_retries {
                        retries += 1;
                        debug!(
                            step = step.step_number,
                            retries, "evaluation failed; retrying"
                        );
                        sleep(self.config.retry_backoff).await;
                        continue;
                    }
                    return Ok(StepVerdict {
                        success: false,
                        attempt: Some(attempt),
                        retries,
                        error: None,
                    });
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    if retries < step.max_retries {
                        retries += 1;
                        warn!(step = step.step_number, %err, retries, "attempt failed; retrying");
                        sleep(self.config.retry_backoff).await;
                        continue;
                    }
                    return Ok(StepVerdict {
                        success: false,
                        attempt: None,
                        retries,
                        error: Some(err.to_string()),
                    });
                }
            }
        }
    }

    /// One attempt: confirm, resolve, execute, evaluate.
    async fn attempt_step(
        &self,
        step: &TestStep,
        state: &TestState,
    ) -> Result<StepAttempt, RunnerError> {
        let instruction = self.oracle.confirm_instruction(step, &state.context).await?;

        let mut scroll_attempts = None;
        let coordinate = if instruction.kind.is_spatial() {
            Some(
                self.resolve_coordinate(&instruction, &mut scroll_attempts)
                    .await?,
            )
        } else {
            None
        };

        if let Some(coord) = &coordinate {
            if coord.confidence < self.config.min_actionable_confidence {
                return Err(RunnerError::Locator(LocatorError::LowConfidence {
                    target: instruction.target_or_description().to_string(),
                    confidence: coord.confidence,
                }));
            }
        }

        let resolved = ResolvedAction {
            instruction: instruction.clone(),
            coordinate: coordinate.clone(),
        };
        let report = match timeout(
            Duration::from_millis(instruction.timeout_ms),
            self.executor.execute(&resolved),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(RunnerError::StepTimeout(instruction.timeout_ms)),
        };

        if !report.success {
            return Err(RunnerError::ActionFailed(
                report
                    .error
                    .clone()
                    .unwrap_or_else(|| "interaction failed".to_string()),
            ));
        }

        let evaluation = self.oracle.evaluate(step, &instruction, &report).await?;
        Ok(StepAttempt {
            instruction,
            coordinate,
            scroll_attempts,
            report,
            evaluation,
        })
    }

    /// Resolve the coordinate for a spatial instruction.
    ///
    /// Non-scroll actions try a direct locate first and fall back to the
    /// scroll search when the target is not in view; scroll-to-element
    /// goes straight to the scroll search.
    async fn resolve_coordinate(
        &self,
        instruction: &ActionInstruction,
        scroll_attempts: &mut Option<u32>,
    ) -> Result<GridCoordinate, RunnerError> {
        let target = instruction.target_or_description();
        let context = Some(instruction.description.as_str());

        if instruction.kind == ActionKind::ScrollToElement {
            return self.scroll_search(target, context, scroll_attempts).await;
        }

        match self.locator.locate(target, context).await {
            Ok(coordinate) => Ok(coordinate),
            Err(LocatorError::TargetNotFound(reason)) => {
                debug!(element = target, %reason, "not in view; starting scroll search");
                self.scroll_search(target, context, scroll_attempts).await
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn scroll_search(
        &self,
        target: &str,
        context: Option<&str>,
        scroll_attempts: &mut Option<u32>,
    ) -> Result<GridCoordinate, RunnerError> {
        let result = self.scroller.scroll_to(target, context).await?;
        *scroll_attempts = Some(result.attempts);
        result.coordinates.ok_or_else(|| {
            RunnerError::Locator(LocatorError::TargetNotFound(format!(
                "scroll search returned no coordinate for `{target}`"
            )))
        })
    }

    /// Build the audit record for a finished step.
    fn journal_entry(&self, step: &TestStep, verdict: &StepVerdict) -> JournalEntry {
        let (action_taken, expected) = match &verdict.attempt {
            Some(attempt) => (
                attempt.instruction.description.clone(),
                attempt.instruction.expected_outcome.clone(),
            ),
            None => (
                step.instruction.description.clone(),
                step.instruction.expected_outcome.clone(),
            ),
        };
        let actual = verdict
            .attempt
            .as_ref()
            .map(|a| a.evaluation.actual_outcome.clone())
            .or_else(|| verdict.error.clone())
            .unwrap_or_default();

        JournalEntry {
            timestamp: Utc::now(),
            scenario: self.config.scenario_name.clone(),
            step_reference: format!("step {}: {}", step.step_number, step.description),
            action_taken,
            coordinate: verdict.attempt.as_ref().and_then(|a| a.coordinate.clone()),
            scroll_attempts: verdict.attempt.as_ref().and_then(|a| a.scroll_attempts),
            expected_result: expected,
            actual_result: actual,
            confidence: verdict
                .attempt
                .as_ref()
                .map(|a| a.evaluation.confidence)
                .unwrap_or(0.0),
            screenshot_before: verdict
                .attempt
                .as_ref()
                .and_then(|a| a.report.screenshot_before.clone()),
            screenshot_after: verdict
                .attempt
                .as_ref()
                .and_then(|a| a.report.screenshot_after.clone()),
            execution_time_ms: verdict
                .attempt
                .as_ref()
                .map(|a| a.report.duration_ms)
                .unwrap_or(0),
            retries: verdict.retries,
            success: verdict.success,
            replay_command: verdict
                .attempt
                .as_ref()
                .and_then(|a| a.report.replay_command.clone()),
        }
    }
}
