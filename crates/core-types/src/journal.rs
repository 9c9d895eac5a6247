//! Audit journal records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::grid::GridCoordinate;

/// One write-once audit record per executed step.
///
/// Entries are serializable on their own so a journal can be exported and
/// replayed without the in-memory object graph that produced it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JournalEntry {
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,

    /// Name of the scenario being executed.
    pub scenario: String,

    /// Step reference, e.g. `step 3: Click the login button`.
    pub step_reference: String,

    /// Action actually taken.
    pub action_taken: String,

    /// Resolved coordinate, including refinement detail.
    #[serde(default)]
    pub coordinate: Option<GridCoordinate>,

    /// Scroll attempts spent finding the target, when a scroll search ran.
    #[serde(default)]
    pub scroll_attempts: Option<u32>,

    /// Expected result from the instruction.
    pub expected_result: String,

    /// Observed result from the evaluation.
    pub actual_result: String,

    /// Evaluation confidence, 0.0 to 1.0.
    pub confidence: f32,

    /// Screenshot reference before the action.
    #[serde(default)]
    pub screenshot_before: Option<String>,

    /// Screenshot reference after the action.
    #[serde(default)]
    pub screenshot_after: Option<String>,

    /// Wall-clock execution time in milliseconds.
    pub execution_time_ms: u64,

    /// Retries spent before this outcome.
    pub retries: u32,

    /// Whether the step ultimately succeeded.
    pub success: bool,

    /// Replayable low-level command, e.g. `click(312, 148)`.
    #[serde(default)]
    pub replay_command: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridCell;

    #[test]
    fn entry_serializes_standalone() {
        let entry = JournalEntry {
            timestamp: Utc::now(),
            scenario: "login".into(),
            step_reference: "step 1: Open the login page".into(),
            action_taken: "navigate".into(),
            coordinate: Some(GridCoordinate::centered(
                "M23".parse::<GridCell>().unwrap(),
                0.92,
            )),
            scroll_attempts: None,
            expected_result: "Login form shown".into(),
            actual_result: "Login form shown".into(),
            confidence: 0.92,
            screenshot_before: Some("shots/001-before.png".into()),
            screenshot_after: Some("shots/001-after.png".into()),
            execution_time_ms: 340,
            retries: 0,
            success: true,
            replay_command: Some("goto(\"https://example.test/login\")".into()),
        };

        let json = serde_json::to_string(&entry).unwrap();
        let back: JournalEntry = serde_json::from_str(&json).unwrap();
        assert!(back.success);
        assert_eq!(back.coordinate.unwrap().cell.to_string(), "M23");
    }
}
