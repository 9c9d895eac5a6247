//! The planning/evaluation collaborator seam.

use std::collections::HashMap;

use async_trait::async_trait;
use gridpilot_core_types::{ActionInstruction, EvaluationResult, TestStep};

use crate::errors::RunnerError;
use crate::executor::ExecutionReport;

/// Collaborator that confirms instructions before execution and judges
/// outcomes afterwards.
///
/// Implementations own prompts and response parsing; malformed output
/// surfaces as [`RunnerError::OracleResponseInvalid`] after their own
/// bounded re-asks, never as a panic.
#[async_trait]
pub trait RunnerOracle: Send + Sync {
    /// Confirm or adjust the instruction for a step, given the values
    /// accumulated from earlier steps.
    async fn confirm_instruction(
        &self,
        step: &TestStep,
        context: &HashMap<String, serde_json::Value>,
    ) -> Result<ActionInstruction, RunnerError>;

    /// Judge whether the executed action produced the expected outcome.
    async fn evaluate(
        &self,
        step: &TestStep,
        instruction: &ActionInstruction,
        report: &ExecutionReport,
    ) -> Result<EvaluationResult, RunnerError>;
}
