//! JSON snapshot store.
//!
//! Writes ProfileSnapshot structs to pretty-printed JSON files and reads them
//! back. Entries are sorted by signature, so two saved snapshots can be
//! compared with plain text diff tools as well as with the diff engine.

use crate::snapshot::ProfileSnapshot;
use crate::utils::config::SCHEMA_VERSION;
use crate::utils::error::StoreError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a snapshot to a JSON file
///
/// **Public** - main entry point for snapshot persistence
///
/// # Arguments
/// * `snapshot` - Snapshot to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `StoreError::Io` - I/O error during write
/// * `StoreError::InvalidPath` - Path cannot be created or is invalid
///
/// # Example
/// ```ignore
/// let snapshot = aggregator.snapshot();
/// write_snapshot(&snapshot, "heap.json")?;
/// ```
pub fn write_snapshot(
    snapshot: &ProfileSnapshot,
    output_path: impl AsRef<Path>,
) -> Result<(), StoreError> {
    let output_path = output_path.as_ref();

    info!("Writing snapshot to: {}", output_path.display());

    validate_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    // serialize before creating the file; a failure leaves no partial output
    let json = snapshot_to_string(snapshot)?;

    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    info!(
        "Snapshot written successfully ({} entries, {} bytes)",
        snapshot.entries().len(),
        json.len() + 1
    );

    Ok(())
}

/// Serialize a snapshot to its JSON text form
pub fn snapshot_to_string(snapshot: &ProfileSnapshot) -> Result<String, StoreError> {
    serde_json::to_string_pretty(snapshot).map_err(|e| StoreError::Io(e.into()))
}

/// Parse a snapshot from JSON text
///
/// # Errors
/// * `StoreError::MalformedInput` - Text is not a valid snapshot
/// * `StoreError::UnsupportedVersion` - Snapshot written by an incompatible schema
pub fn snapshot_from_str(source_name: &str, text: &str) -> Result<ProfileSnapshot, StoreError> {
    let snapshot: ProfileSnapshot = serde_json::from_str(text)
        .map_err(|e| StoreError::malformed(source_name, e.to_string()))?;

    if !is_compatible_version(snapshot.version()) {
        return Err(StoreError::UnsupportedVersion(snapshot.version().to_string()));
    }

    Ok(snapshot)
}

/// Read a snapshot from a JSON file
///
/// **Public** - used by validate, top, collapse and diff
///
/// # Errors
/// * `StoreError::Io` - File read error
/// * `StoreError::MalformedInput` - JSON parse error
/// * `StoreError::UnsupportedVersion` - Incompatible schema version
pub fn read_snapshot(input_path: impl AsRef<Path>) -> Result<ProfileSnapshot, StoreError> {
    let input_path = input_path.as_ref();

    debug!("Reading snapshot from: {}", input_path.display());

    let text = std::fs::read_to_string(input_path)?;
    let snapshot = snapshot_from_str(&input_path.display().to_string(), &text)?;

    debug!(
        "Snapshot loaded: version {}, {} entries, rate {}",
        snapshot.version(),
        snapshot.entries().len(),
        snapshot.sampling_rate()
    );

    Ok(snapshot)
}

/// Validate that output path is writable
pub fn validate_path(path: &Path) -> Result<(), StoreError> {
    if path.as_os_str().is_empty() {
        return Err(StoreError::InvalidPath("Path is empty".to_string()));
    }

    if path.exists() && path.is_dir() {
        return Err(StoreError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Same major version as this build
fn is_compatible_version(version: &str) -> bool {
    let major = |v: &str| v.split('.').next().map(str::to_string);
    major(version).is_some() && major(version) == major(SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{CallStackSignature, Frame};
    use crate::snapshot::AggregateEntry;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    fn create_test_snapshot() -> ProfileSnapshot {
        let taken_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ProfileSnapshot::new(
            taken_at,
            512,
            vec![AggregateEntry {
                signature: CallStackSignature::new(vec![
                    Frame::new("main"),
                    Frame::with_location("decode", "src/codec.rs", 88),
                ]),
                alloc_objects: 10,
                alloc_bytes: 4096,
                live_objects: 2,
                live_bytes: 512,
            }],
        )
    }

    #[test]
    fn test_write_and_read_snapshot() {
        let snapshot = create_test_snapshot();
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        write_snapshot(&snapshot, path).unwrap();
        let loaded = read_snapshot(path).unwrap();

        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = snapshot_from_str("bad.json", "{ \"version\": ").unwrap_err();
        assert!(matches!(err, StoreError::MalformedInput { .. }));
    }

    #[test]
    fn test_future_major_version_rejected() {
        let text = snapshot_to_string(&create_test_snapshot())
            .unwrap()
            .replace("\"1.0.0\"", "\"2.0.0\"");

        let err = snapshot_from_str("future.json", &text).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion(v) if v == "2.0.0"));
    }

    #[test]
    fn test_validate_path_empty() {
        assert!(validate_path(Path::new("")).is_err());
    }

    #[test]
    fn test_validate_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(validate_path(temp_dir.path()).is_err());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/heap.json");

        write_snapshot(&create_test_snapshot(), &nested_path).unwrap();

        assert!(nested_path.exists());
    }
}
