//! Human-readable progress lines and the closing summary block.
//!
//! Everything here renders to `String`; the orchestration layer decides
//! where it is written.

use std::fmt::Write as _;
use std::path::Path;

use crate::core::month::Month;
use crate::core::outcome::{InvocationOutcome, RunSummary};

const RULE_WIDTH: usize = 50;

pub fn found_dirs_line(count: usize, month: Option<Month>, base_dir: &Path) -> String {
    match month {
        Some(month) => format!(
            "Found {count} date directories for month {month} in {}",
            base_dir.display()
        ),
        None => format!("Found {count} date directories in {}", base_dir.display()),
    }
}

pub fn no_dirs_message(month: Option<Month>, base_dir: &Path) -> String {
    match month {
        Some(month) => format!(
            "No date directories found for month {month} in {}",
            base_dir.display()
        ),
        None => format!("No date directories found in {}", base_dir.display()),
    }
}

/// Blank line, `Processing <name>...`, then the command being run.
pub fn processing_header(dir_name: &str, argv: &[String]) -> String {
    format!("\nProcessing {dir_name}...\nCommand: {}", argv.join(" "))
}

pub fn outcome_lines(dir_name: &str, outcome: &InvocationOutcome) -> String {
    match outcome {
        InvocationOutcome::Success => format!("✓ Successfully processed {dir_name}"),
        InvocationOutcome::Failed { stderr, .. } => {
            format!("✗ Failed to process {dir_name}\n  Error: {stderr}")
        }
        InvocationOutcome::TimedOut { stderr } => {
            format!("✗ Timed out while processing {dir_name}\n  Error: {stderr}")
        }
        InvocationOutcome::SpawnError { message } => {
            format!("✗ Exception while processing {dir_name}: {message}")
        }
    }
}

pub fn summary_block(year: &str, month: Option<Month>, summary: &RunSummary) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();
    let _ = writeln!(out, "\n{rule}");
    match month {
        Some(month) => {
            let _ = writeln!(out, "Processing complete for year {year}, month {month}");
        }
        None => {
            let _ = writeln!(out, "Processing complete for year {year}");
        }
    }
    let _ = writeln!(out, "Successful: {}", summary.successful);
    let _ = writeln!(out, "Failed: {}", summary.failed);
    let _ = writeln!(out, "Total: {}", summary.total);
    let _ = write!(out, "{rule}");
    out
}
