//! Patient billing cleaner.
//!
//! Normalizes uploaded billing CSVs (names, admission/discharge dates and
//! categorical columns), computes summary metrics, and serves the cleaned
//! file back over HTTP.

pub mod cli;
pub mod error;
pub mod pipeline;
pub mod records;
pub mod server;
pub mod storage;
pub mod transform;
