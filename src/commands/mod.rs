//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod diff;
pub mod inspect;
pub mod models;
pub mod utils;

// Re-export main command functions
pub use diff::{execute_diff, load_input, load_table, LoadedInput};
pub use inspect::{execute_collapse, execute_top, validate_collapse_args, validate_top_args};
pub use models::{CollapseArgs, DiffArgs, TopArgs};
pub use utils::{display_schema, display_version, validate_input_file};
