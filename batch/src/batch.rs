//! Orchestration for one `mjai-batch` run.
//!
//! discover → filter → iterate → invoke → aggregate → report. Invocations are
//! strictly sequential and each directory is attempted exactly once.

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::core::month::Month;
use crate::core::outcome::{InvocationResult, RunSummary};
use crate::core::report::{
    found_dirs_line, no_dirs_message, outcome_lines, processing_header, summary_block,
};
use crate::io::config::BatchConfig;
use crate::io::dumper::{FeatureDumper, dump_request};
use crate::io::layout::{ensure_output_dir, list_date_dirs, resolve_base_dir};

/// What to process in one run.
#[derive(Debug, Clone)]
pub struct BatchRequest<'a> {
    /// Year directory name under the log root (free-form).
    pub year: &'a str,
    /// Restrict to date directories of this month.
    pub month: Option<Month>,
    pub config: &'a BatchConfig,
}

/// A completed run: every attempted directory plus the aggregated counts.
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub year: String,
    pub month: Option<Month>,
    pub base_dir: PathBuf,
    pub output_dir: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per matched directory, in processing order.
    pub results: Vec<InvocationResult>,
    pub summary: RunSummary,
}

/// Run the feature dumper over every matching date directory.
///
/// Fails before any invocation when the year directory is missing or no
/// directory matches. Individual dump failures are recorded in the returned
/// run and never abort the loop. Progress lines and the summary are written
/// to `out`.
#[instrument(skip_all, fields(year = request.year, month = ?request.month))]
pub fn run_batch<D: FeatureDumper, W: Write>(
    request: &BatchRequest<'_>,
    dumper: &D,
    out: &mut W,
) -> Result<BatchRun> {
    let config = request.config;
    let base_dir = resolve_base_dir(&config.log_root, request.year)?;

    let dirs = list_date_dirs(&base_dir, request.month)?;
    if dirs.is_empty() {
        bail!("{}", no_dirs_message(request.month, &base_dir));
    }
    writeln!(out, "{}", found_dirs_line(dirs.len(), request.month, &base_dir))
        .context("write progress")?;
    info!(count = dirs.len(), base_dir = %base_dir.display(), "date directories found");

    ensure_output_dir(&config.output_dir)?;

    let started_at = Utc::now();
    let mut results = Vec::with_capacity(dirs.len());
    for dir in &dirs {
        let dump = dump_request(config, &dir.path);
        writeln!(out, "{}", processing_header(&dir.name, &dumper.argv(&dump)))
            .context("write progress")?;

        debug!(dir = %dir.name, "invoking feature dumper");
        let start = Instant::now();
        let outcome = dumper.dump(&dump);
        let duration_ms = start.elapsed().as_millis() as u64;
        if outcome.is_success() {
            debug!(dir = %dir.name, duration_ms, "feature dump succeeded");
        } else {
            warn!(dir = %dir.name, duration_ms, exit_code = ?outcome.exit_code(), "feature dump failed");
        }

        writeln!(out, "{}", outcome_lines(&dir.name, &outcome)).context("write progress")?;
        results.push(InvocationResult {
            dir_name: dir.name.clone(),
            input_dir: dir.path.clone(),
            outcome,
            duration_ms,
        });
    }
    let finished_at = Utc::now();

    let summary = RunSummary::from_results(&results);
    writeln!(out, "{}", summary_block(request.year, request.month, &summary))
        .context("write summary")?;
    info!(
        successful = summary.successful,
        failed = summary.failed,
        total = summary.total,
        "batch complete"
    );

    Ok(BatchRun {
        year: request.year.to_string(),
        month: request.month,
        base_dir,
        output_dir: config.output_dir.clone(),
        started_at,
        finished_at,
        results,
        summary,
    })
}
