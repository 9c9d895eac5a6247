//! Scroll-to-find search for targets outside the current viewport.
//!
//! A sequential state machine layered on the visual locator: query
//! visibility, scroll, correct overshoots, stop on a hard attempt
//! ceiling. Never spawns concurrent search branches.

pub mod controller;
pub mod errors;
pub mod mock;
pub mod surface;

pub use controller::{ScrollConfig, ScrollController, SearchPhase};
pub use errors::ScrollError;
pub use mock::RecordingSurface;
pub use surface::ScrollSurface;
