use std::sync::Arc;

use gridpilot_core_types::ScrollDirection;
use grid_locator::{GridLocator, ScriptedOracle};
use scroll_control::{RecordingSurface, ScrollConfig, ScrollController, ScrollError};
use serde_json::{json, Value};

fn controller_with(
    visibilities: Vec<Value>,
    config: ScrollConfig,
) -> (ScrollController, Arc<ScriptedOracle>, Arc<RecordingSurface>) {
    let oracle = Arc::new(ScriptedOracle::with_visibilities(visibilities));
    let locator = Arc::new(GridLocator::new(oracle.clone()));
    let surface = Arc::new(RecordingSurface::new());
    let controller = ScrollController::with_config(locator, surface.clone(), config);
    (controller, oracle, surface)
}

#[tokio::test]
async fn never_visible_exhausts_at_the_ceiling() {
    // Scenario: the target never appears; the search must stop after
    // exactly max_attempts gestures and report them all.
    let (controller, _oracle, surface) = controller_with(
        vec![json!({"status": "not_visible"})],
        ScrollConfig::default().max_attempts(15),
    );

    let err = controller.scroll_to("a phantom footer", None).await.unwrap_err();
    match err {
        ScrollError::Exhausted { result } => {
            assert!(!result.success);
            assert_eq!(result.attempts, 15);
            assert_eq!(result.history.len(), 15);
            assert_eq!(surface.len(), 15);
            assert!(result.total_scroll_distance > 0);
        }
        other => panic!("expected Exhausted, got {other}"),
    }
}

#[tokio::test]
async fn shrinking_visibility_triggers_a_correction() {
    // Scenario: 40% visible, scroll down, 10% visible. The next gesture
    // must reverse direction and be marked as a correction.
    let (controller, _oracle, surface) = controller_with(
        vec![
            json!({"status": "partially_visible", "visible_percentage": 40,
                   "suggested_direction": "down", "direction_confidence": 0.9}),
            json!({"status": "partially_visible", "visible_percentage": 10}),
            json!({"status": "fully_visible", "cell": "K30", "confidence": 0.9}),
        ],
        ScrollConfig::default(),
    );

    let result = controller.scroll_to("the subscribe banner", None).await.unwrap();
    assert!(result.success);
    assert_eq!(result.attempts, 2);

    let first = &result.history[0];
    let second = &result.history[1];
    assert_eq!(first.direction, ScrollDirection::Down);
    assert!(!first.is_correction);
    assert_eq!(second.direction, ScrollDirection::Up);
    assert!(second.is_correction);

    let gestures = surface.gestures();
    assert_eq!(gestures[0].0, ScrollDirection::Down);
    assert_eq!(gestures[1].0, ScrollDirection::Up);
    // Corrections use shorter steps to bracket the target.
    assert!(gestures[1].1 < gestures[0].1);
}

#[tokio::test]
async fn partial_then_gone_reverses_direction() {
    let (controller, _oracle, _surface) = controller_with(
        vec![
            json!({"status": "partially_visible", "visible_percentage": 30}),
            json!({"status": "not_visible"}),
            json!({"status": "fully_visible", "cell": "F12", "confidence": 0.95}),
        ],
        ScrollConfig::default(),
    );

    let result = controller.scroll_to("a promo card", None).await.unwrap();
    assert!(result.success);
    assert_eq!(result.history[0].direction, ScrollDirection::Down);
    assert_eq!(result.history[1].direction, ScrollDirection::Up);
    assert!(result.history[1].is_correction);
}

#[tokio::test]
async fn immediately_visible_needs_no_gesture() {
    let (controller, _oracle, surface) = controller_with(
        vec![json!({"status": "fully_visible", "cell": "M23",
                    "offset_x": 0.4, "offset_y": 0.6, "confidence": 0.9})],
        ScrollConfig::default(),
    );

    let result = controller.scroll_to("the search box", None).await.unwrap();
    assert!(result.success);
    assert_eq!(result.attempts, 0);
    assert!(surface.is_empty());
    let coord = result.coordinates.unwrap();
    assert_eq!(coord.cell.to_string(), "M23");
    assert_eq!(result.confidence, Some(0.9));
}

#[tokio::test]
async fn oracle_suggested_pixels_override_the_default() {
    let (controller, _oracle, surface) = controller_with(
        vec![
            json!({"status": "not_visible", "suggested_direction": "down",
                   "direction_confidence": 0.95, "suggested_pixels": 250}),
            json!({"status": "fully_visible", "cell": "A5", "confidence": 0.85}),
        ],
        ScrollConfig::default().step_px(600),
    );

    let result = controller.scroll_to("a sidebar link", None).await.unwrap();
    assert!(result.success);
    assert_eq!(surface.gestures(), vec![(ScrollDirection::Down, 250)]);
    assert_eq!(result.total_scroll_distance, 250);
}
