//! Batch-dump mjai features for every date directory of a year.
//!
//! Reads `tenhou_mjailog/<year>/<YYYYMMDD>/*.json` and runs the configured
//! feature dumper once per day, writing into `features/`.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::debug;

use mjai_batch::batch::{BatchRequest, run_batch};
use mjai_batch::core::month::Month;
use mjai_batch::exit_codes;
use mjai_batch::io::child_env::ChildEnv;
use mjai_batch::io::config::{DEFAULT_CONFIG_FILE, load_config};
use mjai_batch::io::dumper::ProcessDumper;
use mjai_batch::io::run_report::{RunReport, write_run_report};
use mjai_batch::logging;

#[derive(Parser)]
#[command(
    name = "mjai-batch",
    version,
    about = "Batch process tenhou_mjailog JSON files to extract features"
)]
struct Cli {
    /// Year to process (e.g. 2023 or 20xx).
    year: String,

    /// Month to process (01..12). All months when omitted.
    #[arg(long, value_name = "MM")]
    month: Option<Month>,

    /// Config file (defaults to ./mjai-batch.toml when present).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also write a JSON run report to this path.
    #[arg(long, value_name = "PATH")]
    summary_json: Option<PathBuf>,
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_codes::FAILED as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let config_path = match &cli.config {
        Some(path) if !path.exists() => bail!("config {} not found", path.display()),
        Some(path) => path.clone(),
        None => PathBuf::from(DEFAULT_CONFIG_FILE),
    };
    let config = load_config(&config_path)?;
    debug!(config = ?config, "config loaded");

    let cwd = std::env::current_dir().context("resolve working directory")?;
    let env = ChildEnv::with_library_dir(&config.library_path_var, &cwd)?;
    let dumper = ProcessDumper::new(&config, env);

    let request = BatchRequest {
        year: &cli.year,
        month: cli.month,
        config: &config,
    };
    let stdout = io::stdout();
    let run = run_batch(&request, &dumper, &mut stdout.lock())?;

    if let Some(path) = &cli.summary_json {
        write_run_report(path, &RunReport::from_run(&run))?;
        debug!(path = %path.display(), "run report written");
    }
    Ok(exit_codes::for_summary(&run.summary))
}
