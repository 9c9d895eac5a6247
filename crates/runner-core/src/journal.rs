//! The append-only execution journal.

use gridpilot_core_types::JournalEntry;
use serde::Serialize;

/// Append-only store of audit records for one run.
///
/// Entries are never mutated after insertion. The run is single-flow,
/// one step at a time, so no interior locking is needed.
#[derive(Debug, Default, Serialize)]
pub struct ExecutionJournal {
    entries: Vec<JournalEntry>,
}

impl ExecutionJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record.
    pub fn append(&mut self, entry: JournalEntry) {
        self.entries.push(entry);
    }

    /// All records, in execution order.
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the whole journal to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(reference: &str) -> JournalEntry {
        JournalEntry {
            timestamp: Utc::now(),
            scenario: "s".into(),
            step_reference: reference.into(),
            action_taken: "click".into(),
            coordinate: None,
            scroll_attempts: None,
            expected_result: "e".into(),
            actual_result: "a".into(),
            confidence: 0.9,
            screenshot_before: None,
            screenshot_after: None,
            execution_time_ms: 10,
            retries: 0,
            success: true,
            replay_command: None,
        }
    }

    #[test]
    fn appends_in_order() {
        let mut journal = ExecutionJournal::new();
        journal.append(entry("step 1"));
        journal.append(entry("step 2"));
        assert_eq!(journal.len(), 2);
        assert_eq!(journal.entries()[0].step_reference, "step 1");

        let json = journal.to_json().unwrap();
        assert!(json.contains("step 2"));
    }
}
