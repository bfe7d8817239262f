//! Classification of feature-dump invocations and run aggregation.
//!
//! Outcomes are plain values: a failed invocation never becomes an error, so
//! one bad directory cannot stop the batch. Counting happens once, after the
//! loop, over the collected results.

use std::path::PathBuf;

use serde::Serialize;

/// How a single external invocation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvocationOutcome {
    /// Process exited with status zero.
    Success,
    /// Process exited with a non-zero status, or was terminated by a signal
    /// (`exit_code` is `None` then).
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },
    /// Process exceeded the configured timeout and was killed.
    TimedOut { stderr: String },
    /// Process could not be started, or waiting on it failed.
    SpawnError { message: String },
}

impl InvocationOutcome {
    /// Classify a finished process from its exit code and captured stderr.
    pub fn from_exit(exit_code: Option<i32>, stderr: String) -> Self {
        match exit_code {
            Some(0) => Self::Success,
            code => Self::Failed {
                exit_code: code,
                stderr,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Success => Some(0),
            Self::Failed { exit_code, .. } => *exit_code,
            Self::TimedOut { .. } | Self::SpawnError { .. } => None,
        }
    }
}

/// Result for one date directory, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResult {
    /// Date directory name (e.g. `20230215`).
    pub dir_name: String,
    pub input_dir: PathBuf,
    pub outcome: InvocationOutcome,
    pub duration_ms: u64,
}

/// Counts printed at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
}

impl RunSummary {
    pub fn from_results(results: &[InvocationResult]) -> Self {
        let successful = results.iter().filter(|r| r.outcome.is_success()).count();
        Self {
            successful,
            failed: results.len() - successful,
            total: results.len(),
        }
    }

    /// True when at least one directory was processed and none failed.
    pub fn all_succeeded(&self) -> bool {
        self.total > 0 && self.failed == 0
    }
}
