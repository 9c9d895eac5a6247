//! Visual target resolution over the 60x60 grid.
//!
//! Turns a natural-language description of a UI element into a
//! `GridCoordinate` by querying a vision-capable reasoning oracle, with a
//! strict parsing boundary around the oracle's output and a single bounded
//! refinement round when confidence is low.

pub mod decision;
pub mod errors;
pub mod locator;
pub mod mock;
pub mod oracle;

pub use decision::{LocateDecision, VisibilityDecision};
pub use errors::LocatorError;
pub use locator::{GridLocator, LocatorConfig, VisualLocator};
pub use mock::ScriptedOracle;
pub use oracle::{GridRegion, LocateQuery, VisibilityQuery, VisualOracle};
