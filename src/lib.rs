//! Heapdelta
//!
//! Sampling allocation profiling and benchmark delta reporting.
//!
//! The crate has two halves:
//! - a recorder that samples allocation events, aggregates them per
//!   call-stack signature and snapshots the result
//! - a delta reporter that compares two snapshots (or two benchmark result
//!   sets) and reports per-key and aggregate changes
//!
//! ## Getting Started
//!
//! ```bash
//! cargo install heapdelta
//! heapdelta diff --old before.json --new after.json --summary
//! ```

pub mod aggregator;
pub mod bench;
pub mod commands;
pub mod diff;
pub mod output;
pub mod recorder;
pub mod snapshot;
pub mod utils;
