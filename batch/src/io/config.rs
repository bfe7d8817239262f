//! Driver configuration stored in `mjai-batch.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "mjai-batch.toml";

/// Driver configuration (TOML).
///
/// Every field is optional in the file; missing fields fall back to the
/// layout the feature dumper expects (`tenhou_mjailog/` in, `features/` out).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BatchConfig {
    /// Directory holding one subdirectory per year.
    pub log_root: PathBuf,

    /// Shared output directory handed to every invocation.
    pub output_dir: PathBuf,

    /// File pattern passed through as `--input_regex`.
    pub input_regex: String,

    /// Program and leading arguments of the feature dumper
    /// (e.g. `["python3", "main.py"]`).
    pub command: Vec<String>,

    /// Environment variable prepended with the working directory so the
    /// dumper can load a native library sitting next to it.
    pub library_path_var: String,

    /// Per-invocation wall-clock limit in seconds. `0` waits forever.
    pub timeout_secs: u64,

    /// Truncate captured stdout/stderr beyond this many bytes per stream.
    pub output_limit_bytes: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            log_root: PathBuf::from("tenhou_mjailog"),
            output_dir: PathBuf::from("features"),
            input_regex: "*.json".to_string(),
            command: vec!["python3".to_string(), "main.py".to_string()],
            library_path_var: default_library_path_var().to_string(),
            timeout_secs: 0,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl BatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.command.is_empty() || self.command[0].trim().is_empty() {
            return Err(anyhow!("command must be a non-empty array"));
        }
        if self.log_root.as_os_str().is_empty() {
            return Err(anyhow!("log_root must not be empty"));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(anyhow!("output_dir must not be empty"));
        }
        if self.input_regex.trim().is_empty() {
            return Err(anyhow!("input_regex must not be empty"));
        }
        if self.library_path_var.trim().is_empty() || self.library_path_var.contains('=') {
            return Err(anyhow!(
                "library_path_var must be a non-empty variable name without '='"
            ));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Dynamic loader search path variable for the host platform.
pub fn default_library_path_var() -> &'static str {
    if cfg!(target_os = "macos") {
        "DYLD_LIBRARY_PATH"
    } else if cfg!(windows) {
        "PATH"
    } else {
        "LD_LIBRARY_PATH"
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BatchConfig::default()`.
pub fn load_config(path: &Path) -> Result<BatchConfig> {
    if !path.exists() {
        let cfg = BatchConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: BatchConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &BatchConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
