//! Feature dumper abstraction.
//!
//! The [`FeatureDumper`] trait decouples batch orchestration from the external
//! extraction program. Tests use scripted dumpers that return predetermined
//! outcomes without spawning processes.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::core::outcome::InvocationOutcome;
use crate::io::child_env::ChildEnv;
use crate::io::config::BatchConfig;
use crate::io::process::run_command;

/// Everything needed to dump features for one date directory.
#[derive(Debug, Clone)]
pub struct DumpRequest {
    /// Date directory holding the day's JSON logs.
    pub input_dir: PathBuf,
    /// Pattern selecting log files inside `input_dir`.
    pub input_regex: String,
    /// Shared output directory for feature archives.
    pub output_dir: PathBuf,
}

impl DumpRequest {
    /// Fixed flags appended after the configured program and leading args.
    pub fn args(&self) -> Vec<String> {
        vec![
            "--dump_feature".to_string(),
            "--input_logdir".to_string(),
            self.input_dir.display().to_string(),
            "--input_regex".to_string(),
            self.input_regex.clone(),
            "--output_npzdir".to_string(),
            self.output_dir.display().to_string(),
        ]
    }
}

/// Abstraction over feature extraction backends.
pub trait FeatureDumper {
    /// Full argv that [`FeatureDumper::dump`] would run, for progress output.
    fn argv(&self, request: &DumpRequest) -> Vec<String>;

    /// Run one extraction. Failures are reported as outcomes, never as errors.
    fn dump(&self, request: &DumpRequest) -> InvocationOutcome;
}

/// Dumper that spawns the configured external program.
#[derive(Debug, Clone)]
pub struct ProcessDumper {
    program: String,
    leading_args: Vec<String>,
    env: ChildEnv,
    timeout: Option<Duration>,
    output_limit_bytes: usize,
}

impl ProcessDumper {
    pub fn new(config: &BatchConfig, env: ChildEnv) -> Self {
        let (program, leading_args) = match config.command.split_first() {
            Some((program, rest)) => (program.clone(), rest.to_vec()),
            None => (String::new(), Vec::new()),
        };
        Self {
            program,
            leading_args,
            env,
            timeout: config.timeout(),
            output_limit_bytes: config.output_limit_bytes,
        }
    }

    fn command(&self, request: &DumpRequest) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args).args(request.args());
        self.env.apply(&mut cmd);
        cmd
    }
}

impl FeatureDumper for ProcessDumper {
    fn argv(&self, request: &DumpRequest) -> Vec<String> {
        let mut argv = Vec::with_capacity(1 + self.leading_args.len() + 7);
        argv.push(self.program.clone());
        argv.extend(self.leading_args.iter().cloned());
        argv.extend(request.args());
        argv
    }

    #[instrument(skip_all, fields(input_dir = %request.input_dir.display()))]
    fn dump(&self, request: &DumpRequest) -> InvocationOutcome {
        let output = match run_command(
            self.command(request),
            self.timeout,
            self.output_limit_bytes,
        ) {
            Ok(output) => output,
            Err(err) => {
                warn!(err = %format!("{err:#}"), "feature dump could not run");
                return InvocationOutcome::SpawnError {
                    message: format!("{err:#}"),
                };
            }
        };

        if !output.stdout.bytes.is_empty() {
            debug!(stdout = %String::from_utf8_lossy(&output.stdout.bytes), "dumper stdout");
        }
        if output.timed_out {
            return InvocationOutcome::TimedOut {
                stderr: output.stderr_text(),
            };
        }
        InvocationOutcome::from_exit(output.status.code(), output.stderr_text())
    }
}

/// Build the request for `input_dir` from the shared config.
pub fn dump_request(config: &BatchConfig, input_dir: &Path) -> DumpRequest {
    DumpRequest {
        input_dir: input_dir.to_path_buf(),
        input_regex: config.input_regex.clone(),
        output_dir: config.output_dir.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(command: &[&str]) -> BatchConfig {
        BatchConfig {
            command: command.iter().map(|s| s.to_string()).collect(),
            ..BatchConfig::default()
        }
    }

    fn request() -> DumpRequest {
        dump_request(
            &BatchConfig::default(),
            Path::new("tenhou_mjailog/2023/20230215"),
        )
    }

    fn no_env() -> ChildEnv {
        ChildEnv::with_library_dir_from("MJAI_BATCH_UNUSED", Path::new("."), None).expect("env")
    }

    #[test]
    fn argv_appends_fixed_flags() {
        let dumper = ProcessDumper::new(&config_with(&["python3", "main.py"]), no_env());
        assert_eq!(
            dumper.argv(&request()),
            vec![
                "python3",
                "main.py",
                "--dump_feature",
                "--input_logdir",
                "tenhou_mjailog/2023/20230215",
                "--input_regex",
                "*.json",
                "--output_npzdir",
                "features",
            ]
        );
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dumper = ProcessDumper::new(&config_with(&["/no/such/dumper"]), no_env());
        let outcome = dumper.dump(&request());
        assert!(matches!(outcome, InvocationOutcome::SpawnError { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_drives_outcome() {
        let ok = ProcessDumper::new(&config_with(&["true"]), no_env());
        assert_eq!(ok.dump(&request()), InvocationOutcome::Success);

        let failing = ProcessDumper::new(
            &config_with(&["sh", "-c", "echo 'no logs' >&2; exit 4", "dump"]),
            no_env(),
        );
        assert_eq!(
            failing.dump(&request()),
            InvocationOutcome::Failed {
                exit_code: Some(4),
                stderr: "no logs\n".to_string()
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn child_sees_augmented_library_path() {
        let env = ChildEnv::with_library_dir_from("MJAI_BATCH_LIB", Path::new("/libs"), None)
            .expect("env");
        let dumper = ProcessDumper::new(
            &config_with(&["sh", "-c", "test \"$MJAI_BATCH_LIB\" = /libs", "dump"]),
            env,
        );
        assert_eq!(dumper.dump(&request()), InvocationOutcome::Success);
    }

    #[cfg(unix)]
    #[test]
    fn timeout_stops_wrapper_scripts_promptly() {
        let config = BatchConfig {
            timeout_secs: 1,
            ..config_with(&["sh", "-c", "sleep 6; true", "dump"])
        };
        let dumper = ProcessDumper::new(&config, no_env());
        let start = std::time::Instant::now();
        let outcome = dumper.dump(&request());
        assert!(matches!(outcome, InvocationOutcome::TimedOut { .. }));
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_yields_timed_out() {
        let config = BatchConfig {
            timeout_secs: 1,
            ..config_with(&["sh", "-c", "exec sleep 30", "dump"])
        };
        let dumper = ProcessDumper::new(&config, no_env());
        assert!(matches!(
            dumper.dump(&request()),
            InvocationOutcome::TimedOut { .. }
        ));
    }
}
