//! The bounded-refinement visual locator.

use std::sync::Arc;

use async_trait::async_trait;
use gridpilot_core_types::{GridCoordinate, VisibilityResult};
use tracing::{debug, warn};

use crate::decision::{self, LocateDecision};
use crate::errors::LocatorError;
use crate::oracle::{GridRegion, LocateQuery, VisibilityQuery, VisualOracle};

/// Locator tuning knobs.
#[derive(Clone, Debug)]
pub struct LocatorConfig {
    /// Confidence below which a single refinement round is issued.
    pub confidence_threshold: f32,

    /// Radius in cells of the refinement crop around the candidate.
    pub refine_radius: u16,

    /// Re-asks allowed when the oracle returns malformed output.
    pub max_oracle_retries: u32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            refine_radius: 2,
            max_oracle_retries: 2,
        }
    }
}

impl LocatorConfig {
    /// Builder: set the refinement threshold.
    pub fn confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Builder: set the malformed-output re-ask budget.
    pub fn oracle_retries(mut self, retries: u32) -> Self {
        self.max_oracle_retries = retries;
        self
    }
}

/// Resolution of target descriptions to grid coordinates.
#[async_trait]
pub trait VisualLocator: Send + Sync {
    /// Resolve a described element to a coordinate.
    ///
    /// Low confidence is returned, not retried: the caller decides whether
    /// to proceed or abort.
    async fn locate(
        &self,
        target: &str,
        context: Option<&str>,
    ) -> Result<GridCoordinate, LocatorError>;

    /// Ask whether the described element is visible in the viewport.
    async fn visibility(
        &self,
        target: &str,
        context: Option<&str>,
    ) -> Result<VisibilityResult, LocatorError>;
}

/// Default locator over a [`VisualOracle`].
pub struct GridLocator {
    oracle: Arc<dyn VisualOracle>,
    config: LocatorConfig,
}

impl GridLocator {
    /// Create a locator with default configuration.
    pub fn new(oracle: Arc<dyn VisualOracle>) -> Self {
        Self::with_config(oracle, LocatorConfig::default())
    }

    /// Create a locator with explicit configuration.
    pub fn with_config(oracle: Arc<dyn VisualOracle>, config: LocatorConfig) -> Self {
        Self { oracle, config }
    }

    /// One locate call with the bounded malformed-output re-ask budget.
    async fn locate_once(&self, query: &LocateQuery) -> Result<LocateDecision, LocatorError> {
        let mut last_invalid = None;
        for attempt in 0..=self.config.max_oracle_retries {
            let raw = self.oracle.locate(query).await?;
            match decision::parse_locate(&raw) {
                Ok(decision) => return Ok(decision),
                Err(err @ LocatorError::OracleResponseInvalid(_)) => {
                    warn!(
                        element = %query.target,
                        attempt,
                        %err,
                        "malformed locate response"
                    );
                    last_invalid = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_invalid.expect("at least one attempt"))
    }

    /// One visibility call with the same re-ask budget.
    async fn visibility_once(
        &self,
        query: &VisibilityQuery,
    ) -> Result<VisibilityResult, LocatorError> {
        let mut last_invalid = None;
        for attempt in 0..=self.config.max_oracle_retries {
            let raw = self.oracle.visibility(query).await?;
            match decision::parse_visibility(&raw) {
                Ok(result) => return Ok(result),
                Err(err @ LocatorError::OracleResponseInvalid(_)) => {
                    warn!(
                        element = %query.target,
                        attempt,
                        %err,
                        "malformed visibility response"
                    );
                    last_invalid = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_invalid.expect("at least one attempt"))
    }
}

#[async_trait]
impl VisualLocator for GridLocator {
    async fn locate(
        &self,
        target: &str,
        context: Option<&str>,
    ) -> Result<GridCoordinate, LocatorError> {
        let query = LocateQuery::new(target).with_context(context.map(str::to_string));

        let initial = match self.locate_once(&query).await? {
            LocateDecision::Found(coord) => coord,
            LocateDecision::Ambiguous { candidates } => {
                return Err(LocatorError::TargetNotFound(format!(
                    "{candidates} ambiguous candidates for `{target}`"
                )));
            }
            LocateDecision::NotFound { reason } => {
                return Err(LocatorError::TargetNotFound(
                    reason.unwrap_or_else(|| format!("no candidate for `{target}`")),
                ));
            }
        };

        if initial.refined || initial.confidence >= self.config.confidence_threshold {
            debug!(
                element = target,
                cell = %initial.cell,
                confidence = initial.confidence,
                "located without refinement"
            );
            return Ok(initial);
        }

        // One refinement round over a crop around the candidate cell.
        // The round is spent whether or not it improves anything.
        let region = GridRegion::around(initial.cell, self.config.refine_radius);
        let refine_query = LocateQuery::new(target)
            .with_context(context.map(str::to_string))
            .refined_to(region);

        match self.locate_once(&refine_query).await {
            Ok(LocateDecision::Found(refined)) => {
                debug!(
                    element = target,
                    cell = %refined.cell,
                    before = initial.confidence,
                    after = refined.confidence,
                    "refinement applied"
                );
                Ok(refined.with_refined())
            }
            Ok(other) => {
                warn!(element = target, ?other, "refinement found nothing; keeping initial");
                Ok(initial.with_refined())
            }
            Err(err) => {
                warn!(element = target, %err, "refinement failed; keeping initial");
                Ok(initial.with_refined())
            }
        }
    }

    async fn visibility(
        &self,
        target: &str,
        context: Option<&str>,
    ) -> Result<VisibilityResult, LocatorError> {
        let mut query = VisibilityQuery::new(target);
        query.context = context.map(str::to_string);
        self.visibility_once(&query).await
    }
}
