//! Filesystem layout: year directories in, one shared output directory out.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::core::month::Month;

/// A date directory selected for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateDir {
    /// Final path component (e.g. `20230215`).
    pub name: String,
    pub path: PathBuf,
}

/// Resolve `<log_root>/<year>`, failing when it does not exist.
pub fn resolve_base_dir(log_root: &Path, year: &str) -> Result<PathBuf> {
    let base_dir = log_root.join(year);
    if !base_dir.exists() {
        bail!("Directory {} does not exist!", base_dir.display());
    }
    Ok(base_dir)
}

/// Immediate subdirectories of `base_dir`, filtered by month, sorted by path.
///
/// Plain files are ignored. An empty result is returned as-is; the caller
/// decides whether that is an error.
pub fn list_date_dirs(base_dir: &Path, month: Option<Month>) -> Result<Vec<DateDir>> {
    let mut dirs = Vec::new();
    for entry in
        fs::read_dir(base_dir).with_context(|| format!("read {}", base_dir.display()))?
    {
        let entry = entry.context("read entry")?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if month.is_some_and(|m| !m.matches_dir_name(&name)) {
            debug!(dir = %name, "skipping directory outside month filter");
            continue;
        }
        dirs.push(DateDir { name, path });
    }
    dirs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(dirs)
}

/// Create the output directory and any missing parents. Existing directories
/// are left as they are.
pub fn ensure_output_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))
}
