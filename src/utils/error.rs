//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors that can occur while loading or persisting snapshots and benchmark results
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Malformed input in {source_name}: {reason}")]
    MalformedInput { source_name: String, reason: String },

    #[error("Unsupported snapshot schema version: {0}")]
    UnsupportedVersion(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

impl StoreError {
    /// Shorthand for a `MalformedInput` error
    pub fn malformed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        StoreError::MalformedInput {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised on the recording path.
///
/// These never reach the allocating caller: the recorder counts and drops them.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("Sample dropped: signature capacity of {capacity} reached")]
    SamplingDropped { capacity: usize },
}
