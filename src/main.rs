//! Heapdelta CLI
//!
//! Compares allocation profile snapshots and benchmark results between two
//! runs, and inspects individual snapshots.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use heapdelta::commands::{
    display_schema, display_version, execute_collapse, execute_diff, execute_top,
    validate_collapse_args, validate_input_file, validate_top_args, CollapseArgs, DiffArgs,
    TopArgs,
};
use heapdelta::snapshot::Metric;

/// Heapdelta - allocation profile and benchmark delta reporting
#[derive(Parser, Debug)]
#[command(name = "heapdelta")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare two snapshots or two benchmark result files
    Diff {
        /// Baseline input
        old: PathBuf,

        /// Input compared against the baseline
        new: PathBuf,

        /// TOML file with regression thresholds
        #[arg(short, long)]
        threshold: Option<PathBuf>,

        /// Fail when any dimension's total grows by more than this percentage
        #[arg(long, env = "HEAPDELTA_THRESHOLD_PERCENT")]
        threshold_percent: Option<f64>,

        /// Output path for the JSON diff report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the table summary on stdout
        #[arg(long)]
        quiet: bool,
    },

    /// Validate a snapshot JSON or benchmark result file
    Validate {
        /// Path to the input file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Show the hottest call stacks of a snapshot
    Top {
        /// Path to snapshot JSON file
        file: PathBuf,

        /// Metric to rank by
        #[arg(short, long, default_value = "alloc_bytes")]
        metric: Metric,

        /// Number of entries to show
        #[arg(short = 'n', long = "top", default_value = "20")]
        top_n: usize,

        /// Estimate true counts from sampled counters
        #[arg(long)]
        scaled: bool,
    },

    /// Export a snapshot as collapsed stacks for flamegraph tools
    Collapse {
        /// Path to snapshot JSON file
        file: PathBuf,

        /// Metric used as the stack weight
        #[arg(short, long, default_value = "alloc_bytes")]
        metric: Metric,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Estimate true counts from sampled counters
        #[arg(long)]
        scaled: bool,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    // Execute command
    match cli.command {
        Commands::Diff {
            old,
            new,
            threshold,
            threshold_percent,
            output,
            quiet,
        } => {
            execute_diff(DiffArgs {
                old,
                new,
                threshold_file: threshold,
                threshold_percent,
                output,
                summary: !quiet,
            })?;
        }

        Commands::Validate { file } => {
            validate_input_file(&file)?;
        }

        Commands::Top {
            file,
            metric,
            top_n,
            scaled,
        } => {
            let args = TopArgs {
                file,
                metric,
                top_n,
                scaled,
            };
            validate_top_args(&args)?;
            execute_top(args)?;
        }

        Commands::Collapse {
            file,
            metric,
            output,
            scaled,
        } => {
            let args = CollapseArgs {
                file,
                metric,
                output,
                scaled,
            };
            validate_collapse_args(&args)?;
            execute_collapse(args)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
