//! Configuration and constants for the profiler and CLI.

/// Current snapshot schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Average number of allocated bytes between two recorded samples
pub const DEFAULT_SAMPLING_RATE: u64 = 512 * 1024;

/// Maximum number of distinct call-stack signatures tracked per session
pub const DEFAULT_MAX_SIGNATURES: usize = 65_536;

/// Key used for the aggregate row appended to every report section.
///
/// Reserved: benchmark files may not use it as a benchmark name.
pub const TOTAL_ROW_KEY: &str = "[total]";

/// Default number of entries shown by the `top` command
pub const DEFAULT_TOP_ENTRIES: usize = 20;

/// Upper bound for `top` to keep terminal output readable
pub const MAX_TOP_ENTRIES: usize = 1000;

/// Separator between frames in collapsed stack keys
pub const FRAME_SEPARATOR: char = ';';
