//! Stable exit codes for the `mjai-batch` CLI.

/// Every matched date directory was processed successfully.
pub const OK: i32 = 0;
/// Missing year directory, no matching date directories, a failed
/// invocation, or any configuration error.
pub const FAILED: i32 = 1;

/// Exit code for a finished run. A run that processed nothing is a failure.
pub fn for_summary(summary: &crate::core::outcome::RunSummary) -> i32 {
    if summary.all_succeeded() {
        OK
    } else {
        FAILED
    }
}
