//! Persisted test-scenario files.
//!
//! A scenario is a JSON document with a name, free-text requirements, an
//! entry URL and an ordered list of steps. Steps reference their
//! dependencies by step number, which is resolved to step identities when
//! the document is turned into a plan.

use std::collections::HashMap;
use std::path::Path;

use gridpilot_core_types::{ActionInstruction, ActionKind, StepId, TestPlan, TestStep};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors raised while loading or converting a scenario file.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("cannot read scenario file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("scenario missing required field `{0}`")]
    MissingField(&'static str),

    #[error("scenario URL is not valid: {0}")]
    InvalidUrl(String),

    #[error("step {step_number} depends on unknown step number {dependency}")]
    UnknownDependency { step_number: u32, dependency: u32 },
}

/// One step as written in a scenario document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepSpec {
    pub step_number: u32,
    pub description: String,
    pub action: ActionKind,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    pub expected_result: String,
    #[serde(default)]
    pub depends_on: Vec<u32>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_max_retries() -> u32 {
    3
}

/// A persisted test scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub requirements: String,
    pub url: String,
    #[serde(default)]
    pub steps: Vec<StepSpec>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ScenarioFile {
    /// Load and validate a scenario from disk.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let scenario: Self = serde_json::from_str(&text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check required fields the way a user would want them reported.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.name.trim().is_empty() {
            return Err(ScenarioError::MissingField("name"));
        }
        if self.requirements.trim().is_empty() {
            return Err(ScenarioError::MissingField("requirements"));
        }
        if self.url.trim().is_empty() {
            return Err(ScenarioError::MissingField("url"));
        }
        Url::parse(&self.url).map_err(|e| ScenarioError::InvalidUrl(e.to_string()))?;
        Ok(())
    }

    /// Convert the document into an executable plan.
    ///
    /// Dependencies written as step numbers become step identities; a
    /// reference to a number that is not in the document is an error here,
    /// before any browser work starts.
    pub fn into_plan(self) -> Result<TestPlan, ScenarioError> {
        let mut plan = TestPlan::new(self.name, self.requirements, self.url);
        plan.tags = self.tags;

        let mut ids_by_number: HashMap<u32, StepId> = HashMap::new();
        let mut steps = Vec::with_capacity(self.steps.len());
        for spec in &self.steps {
            let step = TestStep::new(spec.step_number, spec.description.clone(), {
                let mut instruction = ActionInstruction::new(
                    spec.action,
                    spec.description.clone(),
                    spec.expected_result.clone(),
                );
                instruction.target = spec.target.clone();
                instruction.value = spec.value.clone();
                if let Some(timeout_ms) = spec.timeout_ms {
                    instruction.timeout_ms = timeout_ms;
                }
                instruction
            })
            .with_optional(spec.optional)
            .with_max_retries(spec.max_retries);
            ids_by_number.insert(spec.step_number, step.id);
            steps.push(step);
        }

        for (spec, step) in self.steps.iter().zip(steps.iter_mut()) {
            for dependency in &spec.depends_on {
                let id = ids_by_number.get(dependency).copied().ok_or(
                    ScenarioError::UnknownDependency {
                        step_number: spec.step_number,
                        dependency: *dependency,
                    },
                )?;
                step.dependencies.insert(id);
            }
        }

        for step in steps {
            plan.push_step(step);
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> serde_json::Value {
        json!({
            "name": "Login flow",
            "requirements": "A user can log in with valid credentials",
            "url": "https://example.test/login",
            "steps": [
                {
                    "step_number": 1,
                    "description": "Open the login page",
                    "action": "navigate",
                    "expected_result": "Login form is shown",
                },
                {
                    "step_number": 2,
                    "description": "Click the Log in button",
                    "action": "click",
                    "target": "blue 'Log in' button",
                    "expected_result": "Dashboard is shown",
                    "depends_on": [1],
                },
            ],
        })
    }

    #[test]
    fn converts_number_references_to_ids() {
        let scenario: ScenarioFile = serde_json::from_value(minimal()).unwrap();
        let plan = scenario.into_plan().unwrap();
        assert_eq!(plan.steps.len(), 2);
        let first = plan.steps[0].id;
        assert!(plan.steps[1].dependencies.contains(&first));
        assert_eq!(plan.steps[1].max_retries, 3);
    }

    #[test]
    fn rejects_unknown_dependency_number() {
        let mut value = minimal();
        value["steps"][1]["depends_on"] = json!([7]);
        let scenario: ScenarioFile = serde_json::from_value(value).unwrap();
        assert!(matches!(
            scenario.into_plan(),
            Err(ScenarioError::UnknownDependency {
                step_number: 2,
                dependency: 7,
            })
        ));
    }

    #[test]
    fn rejects_blank_required_fields() {
        let mut value = minimal();
        value["url"] = json!("");
        let scenario: ScenarioFile = serde_json::from_value(value).unwrap();
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::MissingField("url"))
        ));
    }

    #[test]
    fn rejects_malformed_url() {
        let mut value = minimal();
        value["url"] = json!("not a url");
        let scenario: ScenarioFile = serde_json::from_value(value).unwrap();
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::InvalidUrl(_))
        ));
    }
}
