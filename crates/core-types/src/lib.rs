//! Shared data model for the Gridpilot visual test runner.
//!
//! Pure types only: plans, steps, grid coordinates, scroll bookkeeping,
//! action/evaluation outcomes and journal records. No I/O, no async.

use uuid::Uuid;

pub mod action;
pub mod grid;
pub mod journal;
pub mod outcome;
pub mod plan;
pub mod scroll;
pub mod state;

pub use action::{ActionInstruction, ActionKind};
pub use grid::{CellParseError, GridCell, GridCoordinate, GRID_SIZE};
pub use journal::JournalEntry;
pub use outcome::{ActionResult, ConfidenceLevel, EvaluationResult};
pub use plan::{TestPlan, TestStep};
pub use scroll::{
    ScrollAction, ScrollDirection, ScrollResult, ScrollState, VisibilityResult, VisibilityStatus,
};
pub use state::{TestState, TestStatus};

/// Identity of a single test plan.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PlanId(pub Uuid);

impl PlanId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a single test step within a plan.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct StepId(pub Uuid);

impl StepId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one executed action.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ActionId(pub Uuid);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}
