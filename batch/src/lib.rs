//! Batch driver for the mjai feature dumper.
//!
//! Walks the date directories of one year under `tenhou_mjailog/` and runs the
//! external feature-extraction program once per directory, tallying which
//! invocations succeeded. The split follows the CLI layering:
//!
//! - **[`core`]**: Pure logic (month filter, outcome classification, report
//!   text). No I/O.
//! - **[`io`]**: Side effects (config file, directory discovery, child
//!   environment, process spawning, JSON report).
//!
//! [`batch`] coordinates the two to implement a run.

pub mod batch;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
