//! Runner error types and the recoverable/fatal split.

use std::time::Duration;

use grid_locator::LocatorError;
use scroll_control::ScrollError;
use step_scheduler::ScheduleError;
use thiserror::Error;

/// Errors raised while coordinating a test run.
///
/// Recoverable variants are converted into step failures and feed the
/// retry budget; fatal variants abort the run (session cleanup still
/// happens exactly once).
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Plan validation failed; nothing was executed.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// Visual target resolution failed.
    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// Scroll search failed.
    #[error(transparent)]
    Scroll(#[from] ScrollError),

    /// A planning/evaluation collaborator returned malformed output
    /// past its bounded re-ask budget.
    #[error("oracle response invalid: {0}")]
    OracleResponseInvalid(String),

    /// A collaborator call failed outright (transport, auth).
    #[error("oracle unavailable: {0}")]
    OracleUnavailable(String),

    /// The action executor reported a failed interaction.
    #[error("action execution failed: {0}")]
    ActionFailed(String),

    /// One step attempt exceeded its instruction timeout.
    #[error("step timed out after {0} ms")]
    StepTimeout(u64),

    /// The whole run exceeded its wall-clock budget.
    #[error("run timed out after {0:?}")]
    RunTimeout(Duration),

    /// The run was cancelled by the caller.
    #[error("run cancelled")]
    Cancelled,

    /// The browser session is gone; no further step can execute.
    #[error("browser session lost: {0}")]
    SessionLost(String),
}

impl RunnerError {
    /// Whether this error aborts the run instead of failing one step.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RunnerError::Schedule(_)
                | RunnerError::RunTimeout(_)
                | RunnerError::Cancelled
                | RunnerError::SessionLost(_)
        )
    }
}
