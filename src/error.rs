// =============================================================================
// Error taxonomy for the feature pipeline
// =============================================================================
//
// Three recovery levels:
//   * RowError      — one input row is unusable; the loader drops the row.
//   * LoadError /
//     FeatureError  — one instrument is unusable; the driver skips it.
//   * PipelineError::Output — the output destination is unusable; fatal.
//
// DatasetError covers the merge/split tools, which run on whole files.

use std::path::PathBuf;

use thiserror::Error;

/// Reason a single raw row was dropped by the loader.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("unparseable date '{value}'")]
    BadDate { value: String },
    #[error("column '{column}' is not a finite number: '{value}'")]
    BadNumber { column: &'static str, value: String },
    #[error("row is missing column '{column}'")]
    MissingField { column: &'static str },
}

/// Failure to turn a raw file into a usable price series.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no usable rows in {}", path.display())]
    EmptyInput { path: PathBuf },
    #[error("required column '{column}' not found in header")]
    MissingColumn { column: &'static str },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while composing features for a loaded series.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeatureError {
    #[error("series has {rows} rows but at least {required} are needed")]
    InsufficientHistory { rows: usize, required: usize },
}

/// Invalid parameter values in the pipeline configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("window '{name}' must be at least 1")]
    ZeroWindow { name: &'static str },
    #[error("'{name}' is {value}, above the limit of {max}")]
    WindowTooLarge {
        name: &'static str,
        value: usize,
        max: usize,
    },
    #[error("lag {lag} is listed more than once")]
    DuplicateLag { lag: usize },
    #[error("label horizon must be at least 1")]
    ZeroHorizon,
    #[error("bollinger deviation multiplier must be finite and positive, got {value}")]
    InvalidBandWidth { value: f64 },
    #[error("macd fast window ({fast}) must be shorter than slow window ({slow})")]
    FastNotBelowSlow { fast: usize, slow: usize },
    #[error("worker count must be at least 1")]
    ZeroWorkers,
}

/// Top-level error for one pipeline run or one instrument inside it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("duplicate asset identifier '{asset}'")]
    DuplicateAsset { asset: String },

    #[error("cannot write output {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure in the `merge` / `split` dataset tools.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("required column '{column}' not found in {}", path.display())]
    MissingColumn { column: &'static str, path: PathBuf },

    #[error("csv error in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Whether this error must abort the whole run rather than one instrument.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Output { .. } | Self::Config(_))
    }

    /// Whether the instrument was skipped for lack of data rather than a fault.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::Load(LoadError::EmptyInput { .. })
                | Self::Load(LoadError::MissingColumn { .. })
                | Self::Feature(FeatureError::InsufficientHistory { .. })
        )
    }
}
