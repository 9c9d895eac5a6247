//! The scrollable-surface seam.

use async_trait::async_trait;
use gridpilot_core_types::ScrollDirection;

use crate::errors::ScrollError;

/// Something that can be scrolled by pixel distances.
///
/// Implemented by the action-executor adapter; the controller never talks
/// to the browser directly.
#[async_trait]
pub trait ScrollSurface: Send + Sync {
    /// Scroll the viewport by `pixels` in `direction`.
    async fn scroll_by(&self, direction: ScrollDirection, pixels: u32) -> Result<(), ScrollError>;
}
