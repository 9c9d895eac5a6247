//! Action vocabulary consumed by the execution coordinator.

use serde::{Deserialize, Serialize};

/// Closed set of action kinds a test step can perform.
///
/// Dispatch on this enum is exhaustive everywhere; adding a variant is a
/// deliberate API change, not an open-ended string match.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    Type,
    Navigate,
    Wait,
    Screenshot,
    Assert,
    KeyPress,
    ScrollToElement,
    ScrollByPixels,
    ScrollToTop,
    ScrollToBottom,
    ScrollHorizontal,
}

impl ActionKind {
    /// Whether the action needs a screen coordinate resolved before it can run.
    pub fn is_spatial(self) -> bool {
        matches!(
            self,
            ActionKind::Click | ActionKind::Type | ActionKind::Assert | ActionKind::ScrollToElement
        )
    }

    /// Whether the action is one of the scroll variants.
    pub fn is_scroll(self) -> bool {
        matches!(
            self,
            ActionKind::ScrollToElement
                | ActionKind::ScrollByPixels
                | ActionKind::ScrollToTop
                | ActionKind::ScrollToBottom
                | ActionKind::ScrollHorizontal
        )
    }

    /// Short lowercase name used in logs and journal entries.
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Click => "click",
            ActionKind::Type => "type",
            ActionKind::Navigate => "navigate",
            ActionKind::Wait => "wait",
            ActionKind::Screenshot => "screenshot",
            ActionKind::Assert => "assert",
            ActionKind::KeyPress => "key_press",
            ActionKind::ScrollToElement => "scroll_to_element",
            ActionKind::ScrollByPixels => "scroll_by_pixels",
            ActionKind::ScrollToTop => "scroll_to_top",
            ActionKind::ScrollToBottom => "scroll_to_bottom",
            ActionKind::ScrollHorizontal => "scroll_horizontal",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One concrete instruction produced by the planning collaborator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionInstruction {
    /// What to do.
    pub kind: ActionKind,

    /// Human-readable description of the action.
    pub description: String,

    /// Description of the target element, for spatial actions.
    #[serde(default)]
    pub target: Option<String>,

    /// Value for type/key-press/scroll-by-pixels actions.
    #[serde(default)]
    pub value: Option<String>,

    /// What the collaborator expects to observe afterwards.
    pub expected_outcome: String,

    /// Per-action timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl ActionInstruction {
    /// Create an instruction with the default timeout.
    pub fn new(
        kind: ActionKind,
        description: impl Into<String>,
        expected_outcome: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            target: None,
            value: None,
            expected_outcome: expected_outcome.into(),
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Set the target element description.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the action value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the per-action timeout.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Target description, falling back to the action description.
    pub fn target_or_description(&self) -> &str {
        self.target.as_deref().unwrap_or(&self.description)
    }
}
