//! Command-line interface for the feature pipeline.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `build` | Raw per-instrument CSVs => structured feature tables |
//! | `merge` | Structured tables => one long-format dataset |
//! | `split` | Merged dataset => train / test files by date |
//! | `init-config` | Write the default configuration file |
//!
//! Flags override the matching configuration fields for one invocation only.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::runtime_config::PipelineConfig;

/// OHLCV feature engineering pipeline.
#[derive(Debug, Parser)]
#[command(
    name = "ohlcv-features",
    version,
    about = "Turn raw daily OHLCV files into labelled feature tables"
)]
pub struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, global = true, default_value = "pipeline_config.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build one structured feature table per raw input file.
    ///
    ///   ohlcv-features build
    ///   ohlcv-features build --input data --output STRUCTURED --workers 4
    Build(BuildArgs),

    /// Merge structured tables into one dataset with an `asset` column.
    Merge(MergeArgs),

    /// Split the merged dataset into train and test files at a cutoff date.
    Split(SplitArgs),

    /// Write the default configuration to `--config`.
    InitConfig(InitConfigArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct BuildArgs {
    /// Directory of raw per-instrument CSV files.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Directory for structured output files.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Instruments processed concurrently.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Forward horizon for `future_return` / `target`, in rows.
    #[arg(long)]
    pub horizon: Option<usize>,

    /// Also write the per-instrument run report as JSON to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl BuildArgs {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(input) = &self.input {
            config.input_dir = input.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(horizon) = self.horizon {
            config.label.horizon = horizon;
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct MergeArgs {
    /// Directory of structured tables (defaults to the configured output dir).
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Merged file to write.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl MergeArgs {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(input) = &self.input {
            config.output_dir = input.clone();
        }
        if let Some(output) = &self.output {
            config.dataset.merged_file = output.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct SplitArgs {
    /// Merged dataset to split.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// First date of the test set (YYYY-MM-DD).
    #[arg(long)]
    pub cutoff: Option<NaiveDate>,

    #[arg(long)]
    pub train: Option<PathBuf>,

    #[arg(long)]
    pub test: Option<PathBuf>,
}

impl SplitArgs {
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(input) = &self.input {
            config.dataset.merged_file = input.clone();
        }
        if let Some(cutoff) = self.cutoff {
            config.dataset.split_date = cutoff;
        }
        if let Some(train) = &self.train {
            config.dataset.train_file = train.clone();
        }
        if let Some(test) = &self.test {
            config.dataset.test_file = test.clone();
        }
    }
}

#[derive(Debug, Clone, Default, Args)]
pub struct InitConfigArgs {
    /// Overwrite an existing file.
    #[arg(long, default_value_t = false)]
    pub force: bool,
}
