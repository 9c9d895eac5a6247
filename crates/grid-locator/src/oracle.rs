//! The visual-reasoning oracle seam.
//!
//! The oracle sees a screenshot with the grid overlay and answers
//! structured questions about it. Its output is untrusted JSON; the
//! typed boundary lives in [`crate::decision`].

use async_trait::async_trait;
use gridpilot_core_types::GridCell;
use serde::{Deserialize, Serialize};

use crate::errors::LocatorError;

/// A cropped region of the grid used for refinement queries.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GridRegion {
    /// Cell the region is centred on.
    pub center: GridCell,

    /// Radius in cells around the centre.
    pub radius: u16,
}

impl GridRegion {
    /// Region of `radius` cells around a candidate cell.
    pub fn around(center: GridCell, radius: u16) -> Self {
        Self { center, radius }
    }

    /// Top-left and bottom-right corners, clamped to the grid.
    pub fn corners(&self) -> (GridCell, GridCell) {
        let r = i32::from(self.radius);
        (
            self.center.offset_clamped(-r, -r),
            self.center.offset_clamped(r, r),
        )
    }
}

/// One locate request against the current screenshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocateQuery {
    /// Description of the element to find.
    pub target: String,

    /// Extra context about the current step, if any.
    #[serde(default)]
    pub context: Option<String>,

    /// Region to re-examine; set on refinement queries only.
    #[serde(default)]
    pub region: Option<GridRegion>,

    /// Whether this is the refinement round.
    #[serde(default)]
    pub refinement: bool,
}

impl LocateQuery {
    /// Initial whole-viewport query.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            context: None,
            region: None,
            refinement: false,
        }
    }

    /// Attach step context.
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    /// Narrow the query to a region for the refinement round.
    pub fn refined_to(mut self, region: GridRegion) -> Self {
        self.region = Some(region);
        self.refinement = true;
        self
    }
}

/// One visibility request against the current viewport.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VisibilityQuery {
    /// Description of the element being searched for.
    pub target: String,

    /// Extra context about the current step, if any.
    #[serde(default)]
    pub context: Option<String>,
}

impl VisibilityQuery {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            context: None,
        }
    }
}

/// Vision-capable reasoning oracle.
///
/// Implementations own prompt construction and screenshot plumbing; this
/// crate only sees the raw JSON they return. The oracle is fallible, slow
/// and possibly malformed by contract, so callers always parse through
/// [`crate::decision`].
#[async_trait]
pub trait VisualOracle: Send + Sync {
    /// Ask where a described element is on the current screenshot.
    async fn locate(&self, query: &LocateQuery) -> Result<serde_json::Value, LocatorError>;

    /// Ask whether a described element is visible in the current viewport.
    async fn visibility(&self, query: &VisibilityQuery) -> Result<serde_json::Value, LocatorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_corners_clamp_at_edges() {
        let cell: GridCell = "A1".parse().unwrap();
        let region = GridRegion::around(cell, 2);
        let (tl, br) = region.corners();
        assert_eq!(tl.to_string(), "A1");
        assert_eq!(br.to_string(), "C3");
    }
}
