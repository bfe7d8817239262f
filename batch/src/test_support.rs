//! Test-only helpers: a scripted dumper and a log-tree fixture.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::outcome::InvocationOutcome;
use crate::io::config::BatchConfig;
use crate::io::dumper::{DumpRequest, FeatureDumper};

/// Dumper that replays queued outcomes and records every request.
///
/// Once the queue is empty every further call succeeds.
#[derive(Debug, Default)]
pub struct ScriptedDumper {
    outcomes: RefCell<VecDeque<InvocationOutcome>>,
    calls: RefCell<Vec<DumpRequest>>,
}

impl ScriptedDumper {
    pub fn new(outcomes: Vec<InvocationOutcome>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<DumpRequest> {
        self.calls.borrow().clone()
    }

    /// Final path component of every input directory, in call order.
    pub fn called_dir_names(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|r| r.input_dir.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }
}

impl FeatureDumper for ScriptedDumper {
    fn argv(&self, request: &DumpRequest) -> Vec<String> {
        let mut argv = vec!["scripted-dumper".to_string()];
        argv.extend(request.args());
        argv
    }

    fn dump(&self, request: &DumpRequest) -> InvocationOutcome {
        self.calls.borrow_mut().push(request.clone());
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or(InvocationOutcome::Success)
    }
}

/// Failed outcome with exit code `code` and the given stderr.
pub fn failed(code: i32, stderr: &str) -> InvocationOutcome {
    InvocationOutcome::Failed {
        exit_code: Some(code),
        stderr: stderr.to_string(),
    }
}

/// Temporary working directory holding a `tenhou_mjailog/` tree.
pub struct LogTree {
    dir: TempDir,
}

impl LogTree {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp dir")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn log_root(&self) -> PathBuf {
        self.path().join("tenhou_mjailog")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path().join("features")
    }

    /// Create `tenhou_mjailog/<year>/<day>/` with one JSON log per day.
    pub fn add_days(&self, year: &str, days: &[&str]) -> Result<()> {
        let base = self.log_root().join(year);
        for day in days {
            let day_dir = base.join(day);
            fs::create_dir_all(&day_dir)
                .with_context(|| format!("create {}", day_dir.display()))?;
            let log = day_dir.join(format!("{day}-0001.json"));
            fs::write(&log, "{\"type\":\"start_game\"}\n")
                .with_context(|| format!("write {}", log.display()))?;
        }
        Ok(())
    }

    pub fn add_year(&self, year: &str) -> Result<()> {
        let base = self.log_root().join(year);
        fs::create_dir_all(&base).with_context(|| format!("create {}", base.display()))
    }

    /// Config pointing at this tree with absolute paths.
    pub fn config(&self) -> BatchConfig {
        BatchConfig {
            log_root: self.log_root(),
            output_dir: self.output_dir(),
            ..BatchConfig::default()
        }
    }
}
