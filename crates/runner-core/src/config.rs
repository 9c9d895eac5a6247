//! Runner configuration.

use std::time::Duration;

/// Tuning knobs for one test run.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Wall-clock budget for the entire run.
    pub run_timeout: Duration,

    /// Fixed pause between retry attempts of a failed step.
    pub retry_backoff: Duration,

    /// Coordinates below this confidence are not acted on; the attempt
    /// fails instead (the locator already spent its refinement round).
    pub min_actionable_confidence: f32,

    /// Scenario name recorded into journal entries.
    pub scenario_name: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            run_timeout: Duration::from_secs(300),
            retry_backoff: Duration::from_millis(300),
            min_actionable_confidence: 0.4,
            scenario_name: String::new(),
        }
    }
}

impl RunnerConfig {
    /// Builder: set the run budget.
    pub fn run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Builder: set the retry backoff.
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Builder: set the scenario name used in journal entries.
    pub fn scenario_name(mut self, name: impl Into<String>) -> Self {
        self.scenario_name = name.into();
        self
    }
}
