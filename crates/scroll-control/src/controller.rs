//! The scroll search state machine.

use std::sync::Arc;

use chrono::Utc;
use gridpilot_core_types::{
    ScrollAction, ScrollDirection, ScrollResult, ScrollState, VisibilityResult, VisibilityStatus,
};
use grid_locator::VisualLocator;
use tracing::{debug, info, warn};

use crate::errors::ScrollError;
use crate::surface::ScrollSurface;

/// Phase of one scroll search.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SearchPhase {
    /// No useful visibility information yet.
    Searching,

    /// An overshoot was detected; scrolling back.
    Correcting,

    /// Terminal: target fully visible.
    Found,

    /// Terminal: attempt ceiling reached.
    Exhausted,
}

/// Scroll search tuning knobs.
#[derive(Clone, Debug)]
pub struct ScrollConfig {
    /// Hard ceiling on scroll gestures per search.
    pub max_attempts: u32,

    /// Default gesture distance in pixels when the oracle suggests none.
    pub default_step_px: u32,

    /// Oracle direction suggestions below this confidence are ignored.
    pub direction_confidence_threshold: f32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            default_step_px: 600,
            direction_confidence_threshold: 0.7,
        }
    }
}

impl ScrollConfig {
    /// Builder: set the attempt ceiling.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Builder: set the default gesture distance.
    pub fn step_px(mut self, pixels: u32) -> Self {
        self.default_step_px = pixels;
        self
    }
}

/// Scroll-to-find controller over a locator and a scrollable surface.
pub struct ScrollController {
    locator: Arc<dyn VisualLocator>,
    surface: Arc<dyn ScrollSurface>,
    config: ScrollConfig,
}

impl ScrollController {
    /// Controller with default configuration.
    pub fn new(locator: Arc<dyn VisualLocator>, surface: Arc<dyn ScrollSurface>) -> Self {
        Self::with_config(locator, surface, ScrollConfig::default())
    }

    /// Controller with explicit configuration.
    pub fn with_config(
        locator: Arc<dyn VisualLocator>,
        surface: Arc<dyn ScrollSurface>,
        config: ScrollConfig,
    ) -> Self {
        Self {
            locator,
            surface,
            config,
        }
    }

    /// Scroll until the target is fully visible or attempts run out.
    ///
    /// Returns the found coordinate inside a [`ScrollResult`]; exhaustion
    /// is an [`ScrollError::Exhausted`] carrying the same diagnostics.
    pub async fn scroll_to(
        &self,
        target: &str,
        context: Option<&str>,
    ) -> Result<ScrollResult, ScrollError> {
        let mut state = ScrollState::with_max_attempts(target, self.config.max_attempts);
        let mut phase = SearchPhase::Searching;

        loop {
            let visibility = self.locator.visibility(target, context).await?;
            debug!(
                element = target,
                status = ?visibility.status,
                pct = ?visibility.visible_percentage,
                attempts = state.attempts,
                ?phase,
                "visibility probe"
            );

            if visibility.status == VisibilityStatus::FullyVisible {
                let coordinate = match visibility.coordinate.clone() {
                    Some(coord) => coord,
                    None => self.locator.locate(target, context).await?,
                };
                info!(
                    element = target,
                    attempts = state.attempts,
                    cell = %coordinate.cell,
                    phase = ?SearchPhase::Found,
                    "target found"
                );
                let confidence = coordinate.confidence;
                return Ok(ScrollResult {
                    success: true,
                    coordinates: Some(coordinate),
                    confidence: Some(confidence),
                    attempts: state.attempts,
                    total_scroll_distance: state.total_distance(),
                    history: state.history,
                });
            }

            if state.exhausted() {
                warn!(
                    element = target,
                    attempts = state.attempts,
                    distance = state.total_distance(),
                    phase = ?SearchPhase::Exhausted,
                    "scroll search exhausted"
                );
                return Err(ScrollError::Exhausted {
                    result: ScrollResult {
                        success: false,
                        coordinates: None,
                        confidence: None,
                        attempts: state.attempts,
                        total_scroll_distance: state.total_distance(),
                        history: state.history,
                    },
                });
            }

            let overshoot = detect_overshoot(&state, &visibility);
            let (direction, is_correction) = if overshoot {
                let committed = state
                    .last_direction
                    .expect("overshoot implies a committed scroll");
                state.overshoot_detected = true;
                phase = SearchPhase::Correcting;
                debug!(element = target, from = %committed, "overshoot; reversing");
                (committed.reversed(), true)
            } else {
                if phase == SearchPhase::Correcting {
                    phase = SearchPhase::Searching;
                }
                (choose_direction(&state, &visibility, &self.config), false)
            };

            let distance = visibility.suggested_pixels.unwrap_or(if is_correction {
                // Overshot means the target sits between the last two
                // positions; shorter steps bracket it.
                self.config.default_step_px / 2
            } else {
                self.config.default_step_px
            });

            self.surface.scroll_by(direction, distance).await?;
            state.record(ScrollAction {
                direction,
                distance,
                is_correction,
                executed_at: Utc::now(),
            });

            state.partially_visible = visibility.status == VisibilityStatus::PartiallyVisible;
            state.last_visible_percentage = if state.partially_visible {
                visibility.visible_percentage
            } else {
                None
            };
        }
    }
}

/// Overshoot rule: the target was partially visible and vanished after a
/// scroll, or its visible share shrank after scrolling the committed
/// direction.
fn detect_overshoot(state: &ScrollState, visibility: &VisibilityResult) -> bool {
    if state.last_direction.is_none() {
        return false;
    }
    if state.partially_visible && visibility.status == VisibilityStatus::NotVisible {
        return true;
    }
    matches!(
        (state.last_visible_percentage, visibility.visible_percentage),
        (Some(before), Some(after)) if after < before
    )
}

/// Direction rule: trust the oracle above the confidence bar, else repeat
/// the committed direction, else start downward.
fn choose_direction(
    state: &ScrollState,
    visibility: &VisibilityResult,
    config: &ScrollConfig,
) -> ScrollDirection {
    if let Some(suggested) = visibility.suggested_direction {
        if visibility.direction_confidence > config.direction_confidence_threshold {
            return suggested;
        }
    }
    state.last_direction.unwrap_or(ScrollDirection::Down)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_visible() -> VisibilityResult {
        VisibilityResult {
            status: VisibilityStatus::NotVisible,
            coordinate: None,
            visible_percentage: None,
            suggested_direction: None,
            direction_confidence: 0.0,
            suggested_pixels: None,
            notes: String::new(),
        }
    }

    fn partially(pct: u8) -> VisibilityResult {
        VisibilityResult {
            status: VisibilityStatus::PartiallyVisible,
            visible_percentage: Some(pct),
            ..not_visible()
        }
    }

    #[test]
    fn first_attempt_defaults_downward() {
        let state = ScrollState::new("x");
        let dir = choose_direction(&state, &not_visible(), &ScrollConfig::default());
        assert_eq!(dir, ScrollDirection::Down);
    }

    #[test]
    fn low_confidence_suggestion_is_ignored() {
        let mut state = ScrollState::new("x");
        state.last_direction = Some(ScrollDirection::Up);
        let mut vis = not_visible();
        vis.suggested_direction = Some(ScrollDirection::Down);
        vis.direction_confidence = 0.3;
        let dir = choose_direction(&state, &vis, &ScrollConfig::default());
        assert_eq!(dir, ScrollDirection::Up);
    }

    #[test]
    fn confident_suggestion_wins() {
        let mut state = ScrollState::new("x");
        state.last_direction = Some(ScrollDirection::Up);
        let mut vis = not_visible();
        vis.suggested_direction = Some(ScrollDirection::Right);
        vis.direction_confidence = 0.9;
        let dir = choose_direction(&state, &vis, &ScrollConfig::default());
        assert_eq!(dir, ScrollDirection::Right);
    }

    #[test]
    fn vanishing_after_partial_is_overshoot() {
        let mut state = ScrollState::new("x");
        state.last_direction = Some(ScrollDirection::Down);
        state.partially_visible = true;
        assert!(detect_overshoot(&state, &not_visible()));
    }

    #[test]
    fn shrinking_share_is_overshoot() {
        let mut state = ScrollState::new("x");
        state.last_direction = Some(ScrollDirection::Down);
        state.partially_visible = true;
        state.last_visible_percentage = Some(40);
        assert!(detect_overshoot(&state, &partially(10)));
    }

    #[test]
    fn no_overshoot_before_first_scroll() {
        let mut state = ScrollState::new("x");
        state.partially_visible = true;
        assert!(!detect_overshoot(&state, &not_visible()));
    }

    #[test]
    fn growing_share_is_not_overshoot() {
        let mut state = ScrollState::new("x");
        state.last_direction = Some(ScrollDirection::Down);
        state.partially_visible = true;
        state.last_visible_percentage = Some(20);
        assert!(!detect_overshoot(&state, &partially(60)));
    }
}
