//! Deterministic, pure logic shared by the batch driver.
//!
//! Core modules must be free of I/O side effects so they can be tested on
//! in-memory values alone.

pub mod month;
pub mod outcome;
pub mod report;
