//! Scroll search error types.

use gridpilot_core_types::ScrollResult;
use grid_locator::LocatorError;
use thiserror::Error;

/// Errors raised while searching for an off-screen target.
#[derive(Debug, Error)]
pub enum ScrollError {
    /// The attempt ceiling was reached without the target becoming
    /// visible. Carries the full result for diagnostics.
    #[error(
        "scroll search exhausted after {} attempts ({} px scrolled)",
        result.attempts,
        result.total_scroll_distance
    )]
    Exhausted { result: ScrollResult },

    /// The underlying locator failed.
    #[error(transparent)]
    Locator(#[from] LocatorError),

    /// The scroll gesture itself could not be executed.
    #[error("scroll gesture failed: {0}")]
    Surface(String),
}
