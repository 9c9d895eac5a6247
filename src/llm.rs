//! HTTP adapter for the reasoning oracle.
//!
//! Talks to an OpenAI-style chat-completions endpoint and exposes the
//! narrow oracle traits the runner consumes. Model output is untrusted:
//! every reply is parsed defensively and malformed replies are re-asked a
//! bounded number of times before the call fails.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use gridpilot_core_types::{ActionInstruction, EvaluationResult, TestStep};
use grid_locator::{LocateQuery, LocatorError, VisibilityQuery, VisualOracle};
use runner_core::{ExecutionReport, RunnerError, RunnerOracle};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

const LOCATOR_SYSTEM_PROMPT: &str = "You are a visual interaction specialist. \
You are shown screenshots with a 60x60 grid overlay (cells A1 through BH60) \
and answer questions about element positions and visibility. \
Reply with a single JSON object and nothing else.";

const RUNNER_SYSTEM_PROMPT: &str = "You are a test execution specialist. \
You confirm test step instructions before execution and judge outcomes \
afterwards. Reply with a single JSON object and nothing else.";

/// Re-asks allowed when the model returns something unparsable.
const MAX_REASKS: u32 = 2;

/// Connection settings for the oracle endpoint.
#[derive(Clone, Debug)]
pub struct OracleClientConfig {
    /// Chat-completions endpoint.
    pub endpoint: Url,

    /// Model identifier.
    pub model: String,

    /// Bearer token.
    pub api_key: String,

    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl OracleClientConfig {
    pub fn new(endpoint: Url, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
            api_key: api_key.into(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Oracle client over HTTP.
pub struct HttpOracle {
    client: reqwest::Client,
    config: OracleClientConfig,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl HttpOracle {
    pub fn new(config: OracleClientConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// One round-trip: send a prompt, demand a JSON object back.
    async fn complete(&self, system: &str, user: String) -> Result<Value, OracleHttpError> {
        let payload = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "response_format": {"type": "json_object"},
        });

        let response = self
            .client
            .post(self.config.endpoint.clone())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| OracleHttpError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleHttpError::Transport(format!(
                "endpoint returned {status}: {body}"
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleHttpError::Malformed(format!("response envelope: {e}")))?;
        let content = chat
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| OracleHttpError::Malformed("empty choices".to_string()))?;
        serde_json::from_str(content)
            .map_err(|e| OracleHttpError::Malformed(format!("reply is not JSON: {e}")))
    }

    /// Send a trivial prompt to verify credentials and connectivity.
    pub async fn check(&self) -> anyhow::Result<()> {
        let reply = self
            .complete(
                RUNNER_SYSTEM_PROMPT,
                "Reply with the JSON object {\"ready\": true}.".to_string(),
            )
            .await
            .map_err(|e| anyhow::anyhow!("oracle check failed: {e}"))?;
        debug!(?reply, "oracle check reply");
        Ok(())
    }

    /// Complete with bounded re-asks, mapping failures through `map_err`.
    async fn complete_validated<T, E>(
        &self,
        system: &str,
        user: &str,
        parse: impl Fn(&Value) -> Result<T, String>,
        map_err: impl Fn(OracleHttpError) -> E,
        invalid: impl Fn(String) -> E,
    ) -> Result<T, E> {
        let mut last_problem = None;
        for attempt in 0..=MAX_REASKS {
            match self.complete(system, user.to_string()).await {
                Ok(value) => match parse(&value) {
                    Ok(parsed) => return Ok(parsed),
                    Err(problem) => {
                        warn!(attempt, %problem, "malformed oracle reply");
                        last_problem = Some(problem);
                    }
                },
                Err(OracleHttpError::Malformed(problem)) => {
                    warn!(attempt, %problem, "unparsable oracle reply");
                    last_problem = Some(problem);
                }
                Err(err) => return Err(map_err(err)),
            }
        }
        Err(invalid(
            last_problem.unwrap_or_else(|| "no reply".to_string()),
        ))
    }
}

/// Internal transport/parse error split.
#[derive(Debug, thiserror::Error)]
enum OracleHttpError {
    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Malformed(String),
}

#[async_trait]
impl VisualOracle for HttpOracle {
    async fn locate(&self, query: &LocateQuery) -> Result<Value, LocatorError> {
        // The locator owns schema validation; this adapter only has to
        // produce some JSON object.
        let user = format!(
            "Find this element on the current screenshot: {}\n\
             Query detail: {}\n\
             Reply with: {{\"found\": bool, \"cell\": \"M23\", \"offset_x\": 0.5, \
             \"offset_y\": 0.5, \"confidence\": 0.9, \"candidates\": 1}} \
             or {{\"found\": false, \"reason\": \"...\"}}.",
            query.target,
            serde_json::to_string(query).unwrap_or_default(),
        );
        self.complete(LOCATOR_SYSTEM_PROMPT, user)
            .await
            .map_err(|e| match e {
                OracleHttpError::Transport(msg) => LocatorError::OracleUnavailable(msg),
                OracleHttpError::Malformed(msg) => LocatorError::OracleResponseInvalid(msg),
            })
    }

    async fn visibility(&self, query: &VisibilityQuery) -> Result<Value, LocatorError> {
        let user = format!(
            "Is this element visible in the current viewport: {}\n\
             Reply with: {{\"status\": \"fully_visible\"|\"partially_visible\"|\"not_visible\", \
             \"cell\": \"M23\", \"confidence\": 0.9, \"visible_percentage\": 40, \
             \"suggested_direction\": \"down\", \"direction_confidence\": 0.8, \
             \"suggested_pixels\": 500, \"notes\": \"...\"}}.",
            query.target,
        );
        self.complete(LOCATOR_SYSTEM_PROMPT, user)
            .await
            .map_err(|e| match e {
                OracleHttpError::Transport(msg) => LocatorError::OracleUnavailable(msg),
                OracleHttpError::Malformed(msg) => LocatorError::OracleResponseInvalid(msg),
            })
    }
}

#[derive(Debug, Deserialize)]
struct EvaluationPayload {
    success: bool,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    actual_outcome: String,
    #[serde(default)]
    deviations: Vec<String>,
    #[serde(default)]
    suggestions: Vec<String>,
    #[serde(default)]
    extracted_values: HashMap<String, Value>,
}

#[async_trait]
impl RunnerOracle for HttpOracle {
    async fn confirm_instruction(
        &self,
        step: &TestStep,
        context: &HashMap<String, Value>,
    ) -> Result<ActionInstruction, RunnerError> {
        let user = format!(
            "Confirm or adjust this test step instruction before execution.\n\
             Step: {}\nAccumulated context: {}\n\
             Reply with the final instruction as JSON: \
             {{\"kind\": \"click\", \"description\": \"...\", \"target\": \"...\", \
             \"value\": null, \"expected_outcome\": \"...\", \"timeout_ms\": 5000}}.",
            serde_json::to_string(&step.instruction).unwrap_or_default(),
            serde_json::to_string(context).unwrap_or_default(),
        );
        self.complete_validated(
            RUNNER_SYSTEM_PROMPT,
            &user,
            |value| {
                serde_json::from_value::<ActionInstruction>(value.clone())
                    .map_err(|e| e.to_string())
            },
            |e| RunnerError::OracleUnavailable(e.to_string()),
            RunnerError::OracleResponseInvalid,
        )
        .await
    }

    async fn evaluate(
        &self,
        step: &TestStep,
        instruction: &ActionInstruction,
        report: &ExecutionReport,
    ) -> Result<EvaluationResult, RunnerError> {
        let user = format!(
            "Judge the outcome of an executed test step.\n\
             Expected outcome: {}\nInteraction result: {}\n\
             Reply with JSON: {{\"success\": bool, \"confidence\": 0.9, \
             \"actual_outcome\": \"...\", \"deviations\": [], \"suggestions\": [], \
             \"extracted_values\": {{}}}}.",
            instruction.expected_outcome,
            serde_json::to_string(report).unwrap_or_default(),
        );
        let step_id = step.id;
        let expected = instruction.expected_outcome.clone();
        self.complete_validated(
            RUNNER_SYSTEM_PROMPT,
            &user,
            move |value| {
                let payload: EvaluationPayload =
                    serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
                Ok(EvaluationResult {
                    step_id,
                    success: payload.success,
                    confidence: payload.confidence.clamp(0.0, 1.0),
                    expected_outcome: expected.clone(),
                    actual_outcome: payload.actual_outcome,
                    deviations: payload.deviations,
                    suggestions: payload.suggestions,
                    extracted_values: payload.extracted_values,
                })
            },
            |e| RunnerError::OracleUnavailable(e.to_string()),
            RunnerError::OracleResponseInvalid,
        )
        .await
    }
}
