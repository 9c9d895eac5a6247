//! Deterministic oracle used for tests and offline development.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::LocatorError;
use crate::oracle::{LocateQuery, VisibilityQuery, VisualOracle};

/// Oracle that replays scripted JSON responses in order.
///
/// When a script runs out, the last response repeats. Call counters let
/// tests assert exactly how many oracle round-trips happened.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    locates: Mutex<Vec<Value>>,
    visibilities: Mutex<Vec<Value>>,
    locate_calls: AtomicUsize,
    visibility_calls: AtomicUsize,
}

impl ScriptedOracle {
    /// Oracle with scripted locate responses only.
    pub fn with_locates(responses: Vec<Value>) -> Self {
        Self {
            locates: Mutex::new(responses),
            ..Default::default()
        }
    }

    /// Oracle with scripted visibility responses only.
    pub fn with_visibilities(responses: Vec<Value>) -> Self {
        Self {
            visibilities: Mutex::new(responses),
            ..Default::default()
        }
    }

    /// Oracle with both scripts.
    pub fn new(locates: Vec<Value>, visibilities: Vec<Value>) -> Self {
        Self {
            locates: Mutex::new(locates),
            visibilities: Mutex::new(visibilities),
            ..Default::default()
        }
    }

    /// Number of locate calls made so far.
    pub fn locate_calls(&self) -> usize {
        self.locate_calls.load(Ordering::SeqCst)
    }

    /// Number of visibility calls made so far.
    pub fn visibility_calls(&self) -> usize {
        self.visibility_calls.load(Ordering::SeqCst)
    }

    fn next(script: &Mutex<Vec<Value>>, index: usize) -> Result<Value, LocatorError> {
        let script = script.lock().expect("script lock");
        if script.is_empty() {
            return Err(LocatorError::OracleUnavailable(
                "scripted oracle has no responses".to_string(),
            ));
        }
        let i = index.min(script.len() - 1);
        Ok(script[i].clone())
    }
}

#[async_trait]
impl VisualOracle for ScriptedOracle {
    async fn locate(&self, _query: &LocateQuery) -> Result<Value, LocatorError> {
        let index = self.locate_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.locates, index)
    }

    async fn visibility(&self, _query: &VisibilityQuery) -> Result<Value, LocatorError> {
        let index = self.visibility_calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.visibilities, index)
    }
}
