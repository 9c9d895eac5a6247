//! Locator error types.

use thiserror::Error;

/// Errors raised while resolving a visual target.
#[derive(Debug, Error)]
pub enum LocatorError {
    /// The oracle reported zero or ambiguous candidates.
    #[error("target not found: {0}")]
    TargetNotFound(String),

    /// The best coordinate stayed below the caller's actionable threshold.
    #[error("low confidence {confidence:.2} for target: {target}")]
    LowConfidence { target: String, confidence: f32 },

    /// The oracle's output did not match the expected schema, even after
    /// the bounded re-ask budget.
    #[error("invalid oracle response: {0}")]
    OracleResponseInvalid(String),

    /// The oracle call itself failed (transport, auth, timeout).
    #[error("oracle unavailable: {0}")]
    OracleUnavailable(String),
}
