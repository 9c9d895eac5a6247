use std::sync::Arc;

use grid_locator::{GridLocator, LocatorConfig, ScriptedOracle, VisualLocator};
use serde_json::json;

#[tokio::test]
async fn low_confidence_triggers_exactly_one_refinement() {
    // First answer sits below the 0.8 threshold; refinement improves it.
    let oracle = Arc::new(ScriptedOracle::with_locates(vec![
        json!({"found": true, "cell": "H12", "confidence": 0.5}),
        json!({"found": true, "cell": "H13", "offset_x": 0.3, "offset_y": 0.7, "confidence": 0.9}),
    ]));
    let locator = GridLocator::new(oracle.clone());

    let coord = locator.locate("the save icon", None).await.unwrap();
    assert_eq!(oracle.locate_calls(), 2);
    assert!(coord.refined);
    assert_eq!(coord.cell.to_string(), "H13");
    assert_eq!(coord.confidence, 0.9);
}

#[tokio::test]
async fn refined_flag_set_even_when_confidence_does_not_improve() {
    let oracle = Arc::new(ScriptedOracle::with_locates(vec![
        json!({"found": true, "cell": "H12", "confidence": 0.5}),
        json!({"found": true, "cell": "H12", "confidence": 0.45}),
    ]));
    let locator = GridLocator::new(oracle.clone());

    let coord = locator.locate("the save icon", None).await.unwrap();
    assert_eq!(oracle.locate_calls(), 2);
    assert!(coord.refined);
    // The refined answer is kept; the caller decides what to do with 0.45.
    assert_eq!(coord.confidence, 0.45);
}

#[tokio::test]
async fn never_more_than_one_refinement_round() {
    // Both answers are low confidence; a second refinement must not happen.
    let oracle = Arc::new(ScriptedOracle::with_locates(vec![
        json!({"found": true, "cell": "B2", "confidence": 0.3}),
        json!({"found": true, "cell": "B3", "confidence": 0.35}),
        json!({"found": true, "cell": "B4", "confidence": 0.99}),
    ]));
    let locator = GridLocator::new(oracle.clone());

    let coord = locator.locate("a faint link", None).await.unwrap();
    assert_eq!(oracle.locate_calls(), 2);
    assert_eq!(coord.cell.to_string(), "B3");
}

#[tokio::test]
async fn failed_refinement_keeps_initial_candidate() {
    let oracle = Arc::new(ScriptedOracle::with_locates(vec![
        json!({"found": true, "cell": "Q8", "confidence": 0.6}),
        json!({"found": false, "reason": "crop is empty"}),
    ]));
    let locator = GridLocator::with_config(
        oracle.clone(),
        LocatorConfig::default().oracle_retries(0),
    );

    let coord = locator.locate("a toolbar button", None).await.unwrap();
    assert_eq!(oracle.locate_calls(), 2);
    assert!(coord.refined);
    assert_eq!(coord.cell.to_string(), "Q8");
    assert_eq!(coord.confidence, 0.6);
}
