//! Recording surface for tests and rehearsal runs.

use std::sync::Mutex;

use async_trait::async_trait;
use gridpilot_core_types::ScrollDirection;

use crate::errors::ScrollError;
use crate::surface::ScrollSurface;

/// Surface that records every gesture and never fails.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    gestures: Mutex<Vec<(ScrollDirection, u32)>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gestures recorded so far.
    pub fn gestures(&self) -> Vec<(ScrollDirection, u32)> {
        self.gestures.lock().expect("gesture lock").clone()
    }

    /// Number of gestures recorded so far.
    pub fn len(&self) -> usize {
        self.gestures.lock().expect("gesture lock").len()
    }

    /// Whether no gesture was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ScrollSurface for RecordingSurface {
    async fn scroll_by(&self, direction: ScrollDirection, pixels: u32) -> Result<(), ScrollError> {
        self.gestures
            .lock()
            .expect("gesture lock")
            .push((direction, pixels));
        Ok(())
    }
}
