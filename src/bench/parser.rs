//! Benchmark result text format.
//!
//! One measurement per line:
//!
//! ```text
//! # name          iterations  ns/op   B/op  allocs/op
//! BenchmarkParse  200000      5123.5  2048  12
//! ```
//!
//! The unit-annotated form printed by benchmark harnesses is accepted too:
//!
//! ```text
//! BenchmarkParse-8  200000  5123.5 ns/op  2048 B/op  12 allocs/op
//! ```
//!
//! Blank lines and `#` comments are ignored. Any other unparseable line
//! rejects the whole input.

use super::store::{BenchmarkMeasurement, BenchmarkResultStore};
use crate::utils::config::TOTAL_ROW_KEY;
use crate::utils::error::StoreError;
use log::{debug, info};
use std::path::Path;

const NS_PER_OP: &str = "ns/op";
const BYTES_PER_OP: &str = "B/op";
const ALLOCS_PER_OP: &str = "allocs/op";

/// Parse benchmark results from text
///
/// # Errors
/// * `StoreError::MalformedInput` - Any non-comment line fails to parse
pub fn parse_results(source_name: &str, text: &str) -> Result<BenchmarkResultStore, StoreError> {
    let mut store = BenchmarkResultStore::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let measurement = parse_line(line).map_err(|reason| {
            StoreError::malformed(source_name, format!("line {}: {}", index + 1, reason))
        })?;
        store.insert(measurement);
    }

    debug!("Parsed {} benchmarks from {}", store.len(), source_name);
    Ok(store)
}

/// Parse a single non-empty, non-comment line
pub fn parse_line(line: &str) -> Result<BenchmarkMeasurement, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 3 {
        return Err(format!("expected at least 3 fields, found {}", tokens.len()));
    }

    let name = tokens[0].to_string();
    if name == TOTAL_ROW_KEY {
        return Err(format!("'{}' is reserved for the aggregate row", TOTAL_ROW_KEY));
    }
    let iterations: u64 = tokens[1]
        .parse()
        .map_err(|_| format!("invalid iteration count '{}'", tokens[1]))?;

    let is_plain = tokens.len() == 5 && tokens[2..].iter().all(|t| t.parse::<f64>().is_ok());
    if is_plain {
        return Ok(BenchmarkMeasurement {
            name,
            iterations,
            ns_per_op: parse_metric(tokens[2])?,
            bytes_per_op: parse_metric(tokens[3])?,
            allocs_per_op: parse_metric(tokens[4])?,
        });
    }

    parse_annotated(name, iterations, &tokens[2..])
}

fn parse_annotated(
    name: String,
    iterations: u64,
    pairs: &[&str],
) -> Result<BenchmarkMeasurement, String> {
    if pairs.len() % 2 != 0 {
        return Err("expected <value> <unit> pairs after the iteration count".to_string());
    }

    let mut measurement = BenchmarkMeasurement {
        name,
        iterations,
        ns_per_op: 0.0,
        bytes_per_op: 0.0,
        allocs_per_op: 0.0,
    };
    let mut known_units = 0;

    for pair in pairs.chunks(2) {
        let value = parse_metric(pair[0])?;
        match pair[1] {
            NS_PER_OP => measurement.ns_per_op = value,
            BYTES_PER_OP => measurement.bytes_per_op = value,
            ALLOCS_PER_OP => measurement.allocs_per_op = value,
            // throughput and custom metrics are not compared
            _ => continue,
        }
        known_units += 1;
    }

    if known_units == 0 {
        return Err(format!(
            "no {}, {} or {} values found",
            NS_PER_OP, BYTES_PER_OP, ALLOCS_PER_OP
        ));
    }

    Ok(measurement)
}

fn parse_metric(token: &str) -> Result<f64, String> {
    let value: f64 = token
        .parse()
        .map_err(|_| format!("invalid number '{}'", token))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("value '{}' must be a finite, non-negative number", token));
    }
    Ok(value)
}

/// Render a store in the plain five-column format
pub fn format_results(store: &BenchmarkResultStore) -> String {
    let mut out = String::from("# name iterations ns/op B/op allocs/op\n");
    for m in store.list() {
        out.push_str(&format!(
            "{} {} {} {} {}\n",
            m.name, m.iterations, m.ns_per_op, m.bytes_per_op, m.allocs_per_op
        ));
    }
    out
}

/// Read benchmark results from a file
pub fn read_results(input_path: impl AsRef<Path>) -> Result<BenchmarkResultStore, StoreError> {
    let input_path = input_path.as_ref();
    debug!("Reading benchmark results from: {}", input_path.display());

    let text = std::fs::read_to_string(input_path)?;
    parse_results(&input_path.display().to_string(), &text)
}

/// Write benchmark results to a file
pub fn write_results(
    store: &BenchmarkResultStore,
    output_path: impl AsRef<Path>,
) -> Result<(), StoreError> {
    let output_path = output_path.as_ref();
    crate::output::validate_path(output_path)?;

    std::fs::write(output_path, format_results(store))?;
    info!(
        "{} benchmark results written to: {}",
        store.len(),
        output_path.display()
    );
    Ok(())
}
