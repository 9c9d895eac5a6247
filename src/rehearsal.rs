//! Offline rehearsal wiring.
//!
//! A rehearsal run exercises the whole pipeline (scheduling, locate,
//! scroll, retries, journal) without a browser or a live oracle: targets
//! resolve to the viewport centre and every evaluation passes. Useful for
//! validating scenario files and dependency graphs before a real run.

use std::sync::Arc;

use grid_locator::ScriptedOracle;
use runner_core::{ScriptedRunnerOracle, SimulatedExecutor};
use serde_json::json;

/// Visual oracle that always finds the target, centred and confident.
pub fn rehearsal_visual_oracle() -> Arc<ScriptedOracle> {
    Arc::new(ScriptedOracle::new(
        vec![json!({
            "found": true,
            "cell": "AD30",
            "offset_x": 0.5,
            "offset_y": 0.5,
            "confidence": 0.95,
        })],
        vec![json!({
            "status": "fully_visible",
            "cell": "AD30",
            "confidence": 0.95,
        })],
    ))
}

/// Runner oracle that confirms instructions verbatim and passes every
/// evaluation.
pub fn rehearsal_runner_oracle() -> Arc<ScriptedRunnerOracle> {
    Arc::new(ScriptedRunnerOracle::passing())
}

/// Executor that records interactions instead of driving a browser.
pub fn rehearsal_executor() -> Arc<SimulatedExecutor> {
    Arc::new(SimulatedExecutor::new())
}
