//! Per-action and per-step outcomes. Append-only once created.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::grid::GridCoordinate;
use crate::{ActionId, StepId};

/// Coarse confidence band for display and summaries.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    /// Classify a 0.0-1.0 score into a band.
    pub fn from_score(score: f32) -> Self {
        if score >= 0.95 {
            ConfidenceLevel::VeryHigh
        } else if score >= 0.8 {
            ConfidenceLevel::High
        } else if score >= 0.6 {
            ConfidenceLevel::Medium
        } else if score >= 0.4 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }
}

/// Result of one executed action.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionResult {
    /// Identity of the executed action.
    pub action_id: ActionId,

    /// Whether the low-level interaction succeeded.
    pub success: bool,

    /// Resolved coordinate the action was performed at, for spatial actions.
    #[serde(default)]
    pub coordinate: Option<GridCoordinate>,

    /// Screenshot reference captured before the action.
    #[serde(default)]
    pub screenshot_before: Option<String>,

    /// Screenshot reference captured after the action.
    #[serde(default)]
    pub screenshot_after: Option<String>,

    /// Wall-clock execution time in milliseconds.
    pub execution_time_ms: u64,

    /// Error message when the interaction failed.
    #[serde(default)]
    pub error: Option<String>,

    /// Confidence carried over from coordinate resolution, 0.0 to 1.0.
    pub confidence: f32,

    /// When the result was recorded.
    pub timestamp: DateTime<Utc>,
}

impl ActionResult {
    /// Successful result with the given timing.
    pub fn success(execution_time_ms: u64, confidence: f32) -> Self {
        Self {
            action_id: ActionId::new(),
            success: true,
            coordinate: None,
            screenshot_before: None,
            screenshot_after: None,
            execution_time_ms,
            error: None,
            confidence: confidence.clamp(0.0, 1.0),
            timestamp: Utc::now(),
        }
    }

    /// Failed result with an error message.
    pub fn failure(execution_time_ms: u64, error: impl Into<String>) -> Self {
        Self {
            action_id: ActionId::new(),
            success: false,
            coordinate: None,
            screenshot_before: None,
            screenshot_after: None,
            execution_time_ms,
            error: Some(error.into()),
            confidence: 0.0,
            timestamp: Utc::now(),
        }
    }

    /// Attach the resolved coordinate.
    pub fn with_coordinate(mut self, coordinate: GridCoordinate) -> Self {
        self.coordinate = Some(coordinate);
        self
    }

    /// Attach screenshot references.
    pub fn with_screenshots(
        mut self,
        before: Option<String>,
        after: Option<String>,
    ) -> Self {
        self.screenshot_before = before;
        self.screenshot_after = after;
        self
    }
}

/// Verdict of the evaluation collaborator for one step attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Step the verdict belongs to.
    pub step_id: StepId,

    /// Whether the expected outcome was observed.
    pub success: bool,

    /// Confidence in the verdict, 0.0 to 1.0.
    pub confidence: f32,

    /// Outcome the instruction expected.
    pub expected_outcome: String,

    /// Outcome actually observed.
    pub actual_outcome: String,

    /// Observed deviations from the expectation.
    #[serde(default)]
    pub deviations: Vec<String>,

    /// Suggested follow-up actions.
    #[serde(default)]
    pub suggestions: Vec<String>,

    /// Values extracted from the page for later steps.
    #[serde(default)]
    pub extracted_values: HashMap<String, serde_json::Value>,
}

impl EvaluationResult {
    /// Passing verdict.
    pub fn passed(
        step_id: StepId,
        confidence: f32,
        expected_outcome: impl Into<String>,
        actual_outcome: impl Into<String>,
    ) -> Self {
        Self {
            step_id,
            success: true,
            confidence: confidence.clamp(0.0, 1.0),
            expected_outcome: expected_outcome.into(),
            actual_outcome: actual_outcome.into(),
            deviations: Vec::new(),
            suggestions: Vec::new(),
            extracted_values: HashMap::new(),
        }
    }

    /// Failing verdict with deviations.
    pub fn failed(
        step_id: StepId,
        confidence: f32,
        expected_outcome: impl Into<String>,
        actual_outcome: impl Into<String>,
        deviations: Vec<String>,
    ) -> Self {
        Self {
            step_id,
            success: false,
            confidence: confidence.clamp(0.0, 1.0),
            expected_outcome: expected_outcome.into(),
            actual_outcome: actual_outcome.into(),
            deviations,
            suggestions: Vec::new(),
            extracted_values: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_bands() {
        assert_eq!(ConfidenceLevel::from_score(0.97), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_score(0.8), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.65), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.4), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0.1), ConfidenceLevel::VeryLow);
    }

    #[test]
    fn action_result_builders() {
        let result = ActionResult::success(120, 0.9)
            .with_screenshots(Some("before.png".into()), Some("after.png".into()));
        assert!(result.success);
        assert_eq!(result.screenshot_before.as_deref(), Some("before.png"));

        let failure = ActionResult::failure(40, "element not interactable");
        assert!(!failure.success);
        assert_eq!(failure.confidence, 0.0);
    }
}
