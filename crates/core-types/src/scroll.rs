//! Scroll bookkeeping types shared by the scroll controller and the
//! execution coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::grid::GridCoordinate;

/// Direction of a scroll gesture.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    /// The opposite direction, used when correcting an overshoot.
    pub fn reversed(self) -> Self {
        match self {
            ScrollDirection::Up => ScrollDirection::Down,
            ScrollDirection::Down => ScrollDirection::Up,
            ScrollDirection::Left => ScrollDirection::Right,
            ScrollDirection::Right => ScrollDirection::Left,
        }
    }
}

impl std::fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
            ScrollDirection::Left => "left",
            ScrollDirection::Right => "right",
        };
        f.write_str(s)
    }
}

/// How much of the target is currently in the viewport.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityStatus {
    FullyVisible,
    PartiallyVisible,
    NotVisible,
}

/// One visibility verdict from the visual-analysis collaborator,
/// produced once per scroll attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VisibilityResult {
    /// Visibility verdict.
    pub status: VisibilityStatus,

    /// Coordinate of the target, when at least partially visible.
    #[serde(default)]
    pub coordinate: Option<GridCoordinate>,

    /// Visible percentage (0-100) when partially visible.
    #[serde(default)]
    pub visible_percentage: Option<u8>,

    /// Direction the collaborator suggests scrolling next.
    #[serde(default)]
    pub suggested_direction: Option<ScrollDirection>,

    /// Confidence in the suggested direction, 0.0 to 1.0.
    #[serde(default)]
    pub direction_confidence: f32,

    /// Suggested scroll distance in pixels, if the collaborator offered one.
    #[serde(default)]
    pub suggested_pixels: Option<u32>,

    /// Free-text observations.
    #[serde(default)]
    pub notes: String,
}

/// One executed scroll gesture.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScrollAction {
    /// Direction scrolled.
    pub direction: ScrollDirection,

    /// Distance in pixels.
    pub distance: u32,

    /// Whether this scroll reverses a detected overshoot.
    #[serde(default)]
    pub is_correction: bool,

    /// When the gesture was issued.
    pub executed_at: DateTime<Utc>,
}

/// Mutable state of one scroll-to-find request. Created per request,
/// discarded once the search terminates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScrollState {
    /// Description of the element being searched for.
    pub target: String,

    /// Scroll attempts performed so far.
    pub attempts: u32,

    /// Hard ceiling on scroll attempts.
    pub max_attempts: u32,

    /// Ordered history of executed scrolls.
    pub history: Vec<ScrollAction>,

    /// Direction of the last committed scroll.
    pub last_direction: Option<ScrollDirection>,

    /// Whether an overshoot has been detected.
    pub overshoot_detected: bool,

    /// Whether the target was partially visible on the previous attempt.
    pub partially_visible: bool,

    /// Visible percentage observed on the previous attempt, if partial.
    pub last_visible_percentage: Option<u8>,
}

/// Default ceiling on scroll attempts per search.
pub const DEFAULT_MAX_SCROLL_ATTEMPTS: u32 = 15;

impl ScrollState {
    /// Fresh state for a target with the default attempt ceiling.
    pub fn new(target: impl Into<String>) -> Self {
        Self::with_max_attempts(target, DEFAULT_MAX_SCROLL_ATTEMPTS)
    }

    /// Fresh state with an explicit attempt ceiling.
    pub fn with_max_attempts(target: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            target: target.into(),
            attempts: 0,
            max_attempts,
            history: Vec::new(),
            last_direction: None,
            overshoot_detected: false,
            partially_visible: false,
            last_visible_percentage: None,
        }
    }

    /// Whether the attempt budget is spent.
    pub fn exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Record an executed scroll.
    pub fn record(&mut self, action: ScrollAction) {
        self.last_direction = Some(action.direction);
        self.history.push(action);
        self.attempts += 1;
    }

    /// Total pixels scrolled across the history.
    pub fn total_distance(&self) -> u64 {
        self.history.iter().map(|a| u64::from(a.distance)).sum()
    }
}

/// Outcome of a scroll-to-find request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScrollResult {
    /// Whether the target was found.
    pub success: bool,

    /// Coordinate of the found target.
    #[serde(default)]
    pub coordinates: Option<GridCoordinate>,

    /// Confidence attached to the coordinate.
    #[serde(default)]
    pub confidence: Option<f32>,

    /// Scroll attempts actually performed.
    pub attempts: u32,

    /// Total pixels scrolled.
    pub total_scroll_distance: u64,

    /// Full gesture history, for diagnostics.
    pub history: Vec<ScrollAction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversal_is_involutive() {
        for dir in [
            ScrollDirection::Up,
            ScrollDirection::Down,
            ScrollDirection::Left,
            ScrollDirection::Right,
        ] {
            assert_eq!(dir.reversed().reversed(), dir);
        }
    }

    #[test]
    fn state_counts_attempts_and_distance() {
        let mut state = ScrollState::with_max_attempts("a button", 2);
        assert!(!state.exhausted());
        state.record(ScrollAction {
            direction: ScrollDirection::Down,
            distance: 600,
            is_correction: false,
            executed_at: Utc::now(),
        });
        state.record(ScrollAction {
            direction: ScrollDirection::Up,
            distance: 300,
            is_correction: true,
            executed_at: Utc::now(),
        });
        assert!(state.exhausted());
        assert_eq!(state.attempts, 2);
        assert_eq!(state.total_distance(), 900);
        assert_eq!(state.last_direction, Some(ScrollDirection::Up));
    }
}
