//! Typed decisions parsed out of untrusted oracle output.
//!
//! Every control-flow-driving answer from the oracle passes through here.
//! The schema is strict: missing or out-of-range fields are an
//! `OracleResponseInvalid` error, never a silent default or an unchecked
//! assumption.

use gridpilot_core_types::{
    GridCell, GridCoordinate, ScrollDirection, VisibilityResult, VisibilityStatus,
};
use serde_json::Value;

use crate::errors::LocatorError;

/// Outcome of a locate query.
#[derive(Clone, Debug, PartialEq)]
pub enum LocateDecision {
    /// Exactly one credible candidate.
    Found(GridCoordinate),

    /// More than one credible candidate; the caller treats this as not found.
    Ambiguous { candidates: u32 },

    /// No candidate.
    NotFound { reason: Option<String> },
}

/// Outcome of a visibility query.
pub type VisibilityDecision = VisibilityResult;

fn invalid(message: impl Into<String>) -> LocatorError {
    LocatorError::OracleResponseInvalid(message.into())
}

fn field<'a>(value: &'a Value, name: &str) -> Result<&'a Value, LocatorError> {
    value
        .get(name)
        .ok_or_else(|| invalid(format!("missing field `{name}`")))
}

fn unit_interval(value: &Value, name: &str) -> Result<f32, LocatorError> {
    let number = value
        .as_f64()
        .ok_or_else(|| invalid(format!("field `{name}` is not a number")))?;
    if !(0.0..=1.0).contains(&number) {
        return Err(invalid(format!("field `{name}` out of range: {number}")));
    }
    Ok(number as f32)
}

fn cell(value: &Value, name: &str) -> Result<GridCell, LocatorError> {
    let text = value
        .as_str()
        .ok_or_else(|| invalid(format!("field `{name}` is not a string")))?;
    text.parse()
        .map_err(|e| invalid(format!("field `{name}`: {e}")))
}

/// Parse a locate response.
///
/// Expected shape:
/// `{"found": true, "cell": "M23", "offset_x": 0.4, "offset_y": 0.6,
///   "confidence": 0.85, "candidates": 1}` or
/// `{"found": false, "reason": "..."}`.
pub fn parse_locate(value: &Value) -> Result<LocateDecision, LocatorError> {
    let found = field(value, "found")?
        .as_bool()
        .ok_or_else(|| invalid("field `found` is not a boolean"))?;

    if !found {
        let reason = value
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string);
        return Ok(LocateDecision::NotFound { reason });
    }

    if let Some(candidates) = value.get("candidates").and_then(Value::as_u64) {
        if candidates == 0 {
            return Ok(LocateDecision::NotFound { reason: None });
        }
        if candidates > 1 {
            return Ok(LocateDecision::Ambiguous {
                candidates: candidates.min(u64::from(u32::MAX)) as u32,
            });
        }
    }

    let cell = cell(field(value, "cell")?, "cell")?;
    let offset_x = match value.get("offset_x") {
        Some(v) => unit_interval(v, "offset_x")?,
        None => 0.5,
    };
    let offset_y = match value.get("offset_y") {
        Some(v) => unit_interval(v, "offset_y")?,
        None => 0.5,
    };
    let confidence = unit_interval(field(value, "confidence")?, "confidence")?;

    Ok(LocateDecision::Found(GridCoordinate::new(
        cell, offset_x, offset_y, confidence,
    )))
}

/// Parse a visibility response.
///
/// Expected shape:
/// `{"status": "partially_visible", "cell": "M23", "visible_percentage": 40,
///   "suggested_direction": "down", "direction_confidence": 0.8,
///   "suggested_pixels": 500, "notes": "..."}`.
pub fn parse_visibility(value: &Value) -> Result<VisibilityDecision, LocatorError> {
    let status = match field(value, "status")?.as_str() {
        Some("fully_visible") => VisibilityStatus::FullyVisible,
        Some("partially_visible") => VisibilityStatus::PartiallyVisible,
        Some("not_visible") => VisibilityStatus::NotVisible,
        Some(other) => return Err(invalid(format!("unknown visibility status `{other}`"))),
        None => return Err(invalid("field `status` is not a string")),
    };

    let coordinate = match (status, value.get("cell")) {
        (VisibilityStatus::NotVisible, _) | (_, None) => None,
        (_, Some(cell_value)) => {
            let cell = cell(cell_value, "cell")?;
            let offset_x = match value.get("offset_x") {
                Some(v) => unit_interval(v, "offset_x")?,
                None => 0.5,
            };
            let offset_y = match value.get("offset_y") {
                Some(v) => unit_interval(v, "offset_y")?,
                None => 0.5,
            };
            let confidence = match value.get("confidence") {
                Some(v) => unit_interval(v, "confidence")?,
                None => 0.0,
            };
            Some(GridCoordinate::new(cell, offset_x, offset_y, confidence))
        }
    };

    let visible_percentage = match value.get("visible_percentage") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let pct = v
                .as_u64()
                .ok_or_else(|| invalid("field `visible_percentage` is not an integer"))?;
            if pct > 100 {
                return Err(invalid(format!("visible_percentage out of range: {pct}")));
            }
            Some(pct as u8)
        }
    };

    let suggested_direction = match value.get("suggested_direction") {
        None | Some(Value::Null) => None,
        Some(v) => Some(parse_direction(v)?),
    };

    let direction_confidence = match value.get("direction_confidence") {
        None | Some(Value::Null) => 0.0,
        Some(v) => unit_interval(v, "direction_confidence")?,
    };

    let suggested_pixels = match value.get("suggested_pixels") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let px = v
                .as_u64()
                .ok_or_else(|| invalid("field `suggested_pixels` is not an integer"))?;
            if px == 0 || px > 20_000 {
                return Err(invalid(format!("suggested_pixels out of range: {px}")));
            }
            Some(px as u32)
        }
    };

    let notes = value
        .get("notes")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(VisibilityResult {
        status,
        coordinate,
        visible_percentage,
        suggested_direction,
        direction_confidence,
        suggested_pixels,
        notes,
    })
}

fn parse_direction(value: &Value) -> Result<ScrollDirection, LocatorError> {
    match value.as_str() {
        Some("up") => Ok(ScrollDirection::Up),
        Some("down") => Ok(ScrollDirection::Down),
        Some("left") => Ok(ScrollDirection::Left),
        Some("right") => Ok(ScrollDirection::Right),
        Some(other) => Err(invalid(format!("unknown scroll direction `{other}`"))),
        None => Err(invalid("field `suggested_direction` is not a string")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_found_locate() {
        let value = json!({
            "found": true,
            "cell": "M23",
            "offset_x": 0.25,
            "offset_y": 0.75,
            "confidence": 0.9,
        });
        match parse_locate(&value).unwrap() {
            LocateDecision::Found(coord) => {
                assert_eq!(coord.cell.to_string(), "M23");
                assert_eq!(coord.offset_x, 0.25);
                assert_eq!(coord.confidence, 0.9);
                assert!(!coord.refined);
            }
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn offsets_default_to_cell_center() {
        let value = json!({"found": true, "cell": "B2", "confidence": 0.8});
        match parse_locate(&value).unwrap() {
            LocateDecision::Found(coord) => {
                assert_eq!(coord.offset_x, 0.5);
                assert_eq!(coord.offset_y, 0.5);
            }
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn ambiguous_candidates_are_flagged() {
        let value = json!({"found": true, "cell": "B2", "confidence": 0.8, "candidates": 3});
        assert_eq!(
            parse_locate(&value).unwrap(),
            LocateDecision::Ambiguous { candidates: 3 }
        );
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let value = json!({"found": true, "cell": "B2", "confidence": 1.4});
        assert!(matches!(
            parse_locate(&value),
            Err(LocatorError::OracleResponseInvalid(_))
        ));
    }

    #[test]
    fn rejects_bad_cell() {
        let value = json!({"found": true, "cell": "ZZ99", "confidence": 0.9});
        assert!(matches!(
            parse_locate(&value),
            Err(LocatorError::OracleResponseInvalid(_))
        ));
    }

    #[test]
    fn rejects_missing_found_field() {
        assert!(matches!(
            parse_locate(&json!({"cell": "A1"})),
            Err(LocatorError::OracleResponseInvalid(_))
        ));
    }

    #[test]
    fn parses_partial_visibility() {
        let value = json!({
            "status": "partially_visible",
            "cell": "C40",
            "visible_percentage": 40,
            "suggested_direction": "down",
            "direction_confidence": 0.8,
            "suggested_pixels": 500,
        });
        let result = parse_visibility(&value).unwrap();
        assert_eq!(result.status, VisibilityStatus::PartiallyVisible);
        assert_eq!(result.visible_percentage, Some(40));
        assert_eq!(result.suggested_direction, Some(ScrollDirection::Down));
        assert_eq!(result.suggested_pixels, Some(500));
    }

    #[test]
    fn not_visible_drops_coordinate() {
        let value = json!({"status": "not_visible", "cell": "C40"});
        let result = parse_visibility(&value).unwrap();
        assert_eq!(result.status, VisibilityStatus::NotVisible);
        assert!(result.coordinate.is_none());
    }

    #[test]
    fn rejects_unknown_status() {
        let value = json!({"status": "sort_of_visible"});
        assert!(matches!(
            parse_visibility(&value),
            Err(LocatorError::OracleResponseInvalid(_))
        ));
    }

    #[test]
    fn rejects_percentage_above_100() {
        let value = json!({"status": "partially_visible", "visible_percentage": 140});
        assert!(matches!(
            parse_visibility(&value),
            Err(LocatorError::OracleResponseInvalid(_))
        ));
    }
}
