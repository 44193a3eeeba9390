//! Benchmark result storage and the line-oriented result format.
//!
//! Benchmark results are the second input kind of the diff engine, next to
//! profile snapshots.

pub mod parser;
pub mod store;

pub use parser::{format_results, parse_line, parse_results, read_results, write_results};
pub use store::{BenchmarkMeasurement, BenchmarkResultStore};
