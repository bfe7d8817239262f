//! I/O helpers for the batch driver.

pub mod child_env;
pub mod config;
pub mod dumper;
pub mod layout;
pub mod process;
pub mod run_report;
