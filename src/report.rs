//! Run summary and journal output.

use std::path::{Path, PathBuf};

use anyhow::Context;
use gridpilot_core_types::ConfidenceLevel;
use runner_core::RunReport;

/// Write `summary.json` and `journal.json` into the output directory.
pub fn write_reports(dir: &Path, report: &RunReport) -> anyhow::Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let summary_path = dir.join("summary.json");
    let summary_json = serde_json::to_string_pretty(&report.summary)?;
    std::fs::write(&summary_path, summary_json)
        .with_context(|| format!("writing {}", summary_path.display()))?;

    let journal_path = dir.join("journal.json");
    std::fs::write(&journal_path, report.journal.to_json()?)
        .with_context(|| format!("writing {}", journal_path.display()))?;

    Ok((summary_path, journal_path))
}

/// Print the human-readable run summary.
pub fn print_summary(report: &RunReport) {
    let summary = &report.summary;
    println!();
    println!("Test Execution Summary");
    println!("  Status:     {}", summary.status);
    println!("  Total:      {}", summary.total_steps);
    println!("  Completed:  {}", summary.completed);
    println!("  Failed:     {}", summary.failed);
    println!("  Skipped:    {}", summary.skipped);
    if summary.unresolved > 0 {
        println!("  Unresolved: {}", summary.unresolved);
    }
    println!("  Errors:     {}", summary.error_count);
    println!("  Warnings:   {}", summary.warning_count);
    if let Some(duration_ms) = summary.duration_ms {
        println!("  Duration:   {:.1}s", duration_ms as f64 / 1000.0);
    }

    for entry in report.journal.entries() {
        let mark = if entry.success { "ok " } else { "FAIL" };
        let band = ConfidenceLevel::from_score(entry.confidence);
        println!(
            "  [{mark}] {} ({:?} confidence, {} retries)",
            entry.step_reference, band, entry.retries
        );
    }
}
