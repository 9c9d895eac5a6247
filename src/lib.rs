//! Gridpilot CLI library
//!
//! Exposes modules for integration testing

pub mod llm;
pub mod rehearsal;
pub mod report;
pub mod scenario;

pub use scenario::{ScenarioError, ScenarioFile, StepSpec};
