//! Machine-readable run report written with `--summary-json`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::batch::BatchRun;
use crate::core::month::Month;
use crate::core::outcome::{InvocationOutcome, RunSummary};

/// Persisted shape of a finished batch run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub year: String,
    pub month: Option<Month>,
    pub base_dir: String,
    pub output_dir: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_secs: f64,
    pub results: Vec<DirRecord>,
    #[serde(flatten)]
    pub summary: RunSummary,
}

/// One processed date directory.
#[derive(Debug, Clone, Serialize)]
pub struct DirRecord {
    pub dir_name: String,
    pub input_dir: String,
    pub exit_code: Option<i32>,
    pub duration_ms: u64,
    pub outcome: InvocationOutcome,
}

impl RunReport {
    pub fn from_run(run: &BatchRun) -> Self {
        let duration = run.finished_at - run.started_at;
        Self {
            year: run.year.clone(),
            month: run.month,
            base_dir: run.base_dir.display().to_string(),
            output_dir: run.output_dir.display().to_string(),
            start_time: run.started_at.to_rfc3339(),
            end_time: run.finished_at.to_rfc3339(),
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            results: run
                .results
                .iter()
                .map(|r| DirRecord {
                    dir_name: r.dir_name.clone(),
                    input_dir: r.input_dir.display().to_string(),
                    exit_code: r.outcome.exit_code(),
                    duration_ms: r.duration_ms,
                    outcome: r.outcome.clone(),
                })
                .collect(),
            summary: run.summary,
        }
    }
}

/// Serialize `report` as pretty JSON with a trailing newline.
pub fn write_run_report(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create report dir {}", parent.display()))?;
    }
    let contents = serde_json::to_string_pretty(report).context("serialize run report")?;
    fs::write(path, format!("{contents}\n"))
        .with_context(|| format!("write run report {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::outcome::InvocationResult;
    use chrono::Utc;
    use std::path::PathBuf;

    fn sample_run() -> BatchRun {
        let results = vec![
            InvocationResult {
                dir_name: "20230215".to_string(),
                input_dir: PathBuf::from("tenhou_mjailog/2023/20230215"),
                outcome: InvocationOutcome::Failed {
                    exit_code: Some(1),
                    stderr: "bad".to_string(),
                },
                duration_ms: 12,
            },
            InvocationResult {
                dir_name: "20230216".to_string(),
                input_dir: PathBuf::from("tenhou_mjailog/2023/20230216"),
                outcome: InvocationOutcome::Success,
                duration_ms: 7,
            },
        ];
        let now = Utc::now();
        BatchRun {
            year: "2023".to_string(),
            month: Month::new(2),
            base_dir: PathBuf::from("tenhou_mjailog/2023"),
            output_dir: PathBuf::from("features"),
            started_at: now,
            finished_at: now,
            summary: RunSummary::from_results(&results),
            results,
        }
    }

    #[test]
    fn report_carries_counts_and_records() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("reports").join("run.json");
        write_run_report(&path, &RunReport::from_run(&sample_run())).expect("write");

        let contents = fs::read_to_string(&path).expect("read");
        assert!(contents.ends_with('\n'));
        let json: serde_json::Value = serde_json::from_str(&contents).expect("parse");
        assert_eq!(json["year"], "2023");
        assert_eq!(json["month"], "02");
        assert_eq!(json["successful"], 1);
        assert_eq!(json["failed"], 1);
        assert_eq!(json["total"], 2);
        assert_eq!(json["results"][0]["dir_name"], "20230215");
        assert_eq!(json["results"][0]["exit_code"], 1);
        assert_eq!(json["results"][0]["outcome"]["kind"], "failed");
        assert_eq!(json["results"][1]["outcome"]["kind"], "success");
    }
}
