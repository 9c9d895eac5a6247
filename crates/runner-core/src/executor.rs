//! The action-executor seam.

use async_trait::async_trait;
use gridpilot_core_types::{ActionInstruction, GridCoordinate};
use serde::{Deserialize, Serialize};

use crate::errors::RunnerError;

/// An instruction with its resolved coordinate, ready to execute.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolvedAction {
    /// The confirmed instruction.
    pub instruction: ActionInstruction,

    /// Resolved coordinate for spatial actions.
    #[serde(default)]
    pub coordinate: Option<GridCoordinate>,
}

/// What the executor observed while performing one interaction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Whether the interaction completed.
    pub success: bool,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,

    /// Error message when the interaction failed.
    #[serde(default)]
    pub error: Option<String>,

    /// Screenshot reference captured before the action.
    #[serde(default)]
    pub screenshot_before: Option<String>,

    /// Screenshot reference captured after the action.
    #[serde(default)]
    pub screenshot_after: Option<String>,

    /// Replayable low-level command, e.g. `click(312, 148)`.
    #[serde(default)]
    pub replay_command: Option<String>,
}

/// Low-level interaction executor owning the browser session.
///
/// The runner does not know how interactions are implemented; it only
/// requires that `release` can be called exactly once at the end of a
/// run, on every exit path.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Perform one interaction at the resolved coordinate.
    async fn execute(&self, action: &ResolvedAction) -> Result<ExecutionReport, RunnerError>;

    /// Release the underlying session. Idempotence is not required of
    /// implementations; the coordinator guarantees a single call.
    async fn release(&self);
}
