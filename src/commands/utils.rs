use super::diff::{load_input, LoadedInput};
use crate::utils::config::SCHEMA_VERSION;
use anyhow::Result;
use std::path::Path;

/// Validate a snapshot JSON file or a benchmark result file
pub fn validate_input_file(file_path: &Path) -> Result<()> {
    println!("Validating input: {}", file_path.display());

    match load_input(file_path)? {
        LoadedInput::Snapshot(snapshot) => {
            let totals = snapshot.totals();

            println!("✓ Valid profile snapshot");
            println!("  Version: {}", snapshot.version());
            println!("  Taken at: {}", snapshot.taken_at().to_rfc3339());
            println!("  Sampling rate: {}", snapshot.sampling_rate());
            println!("  Signatures: {}", snapshot.entries().len());
            println!(
                "  Allocated: {} objects / {} bytes",
                totals.alloc_objects, totals.alloc_bytes
            );
            println!(
                "  Live: {} objects / {} bytes",
                totals.live_objects, totals.live_bytes
            );
        }
        LoadedInput::Benchmarks(store) => {
            println!("✓ Valid benchmark results");
            println!("  Benchmarks: {}", store.len());
        }
    }

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Heapdelta Snapshot Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string          - Schema version (e.g., '1.0.0')");
        println!("  taken_at: string         - RFC 3339 timestamp");
        println!("  sampling_rate: number    - Average bytes between samples (1 = exact)");
        println!("  entries: array           - One entry per call-stack signature");
        println!("    frames: array          - Outermost frame first");
        println!("      function: string     - Function name");
        println!("      file: string?        - Source file (if known)");
        println!("      line: number?        - Source line (if known)");
        println!("    alloc_objects: number  - Objects allocated");
        println!("    alloc_bytes: number    - Bytes allocated");
        println!("    live_objects: number   - Objects not yet freed");
        println!("    live_bytes: number     - Bytes not yet freed");
        println!();
        println!("Benchmark results: one line per benchmark");
        println!("  <name> <iterations> <ns/op> <B/op> <allocs/op>");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Heapdelta v{}", env!("CARGO_PKG_VERSION"));
    println!("Snapshot Schema: v{}", SCHEMA_VERSION);
    println!("Diff Report: v{}", crate::diff::DIFF_VERSION);
    println!();
    println!("Sampling allocation profiler and benchmark delta reporter.");
}
