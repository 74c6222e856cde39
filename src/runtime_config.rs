// =============================================================================
// Pipeline Configuration — JSON settings with atomic save
// =============================================================================
//
// Every tunable parameter of a run lives here: where raw files are read from,
// where structured files go, indicator windows, the label horizon and the
// merge/split file names.  The driver receives a `PipelineConfig` value at
// construction; nothing in the core reads paths or windows from globals.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::indicators;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_input_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("STRUCTURED")
}

fn default_workers() -> usize {
    1
}

fn default_lags() -> Vec<usize> {
    vec![1, 3, 7]
}

fn default_sma_window() -> usize {
    10
}

fn default_ema_window() -> usize {
    10
}

fn default_macd_fast() -> usize {
    12
}

fn default_macd_slow() -> usize {
    26
}

fn default_macd_signal() -> usize {
    9
}

fn default_rsi_window() -> usize {
    14
}

fn default_roc_window() -> usize {
    5
}

fn default_bb_window() -> usize {
    20
}

fn default_bb_dev() -> f64 {
    2.0
}

fn default_atr_window() -> usize {
    14
}

fn default_horizon() -> usize {
    5
}

fn default_merged_file() -> PathBuf {
    PathBuf::from("merged_data.csv")
}

fn default_train_file() -> PathBuf {
    PathBuf::from("train_data.csv")
}

fn default_test_file() -> PathBuf {
    PathBuf::from("test_data.csv")
}

fn default_split_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).expect("2024-01-01 is a valid date")
}

/// Upper bound for every window, lag and the label horizon, in rows.
pub const MAX_WINDOW: usize = 100_000;

fn check_window(name: &'static str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::ZeroWindow { name });
    }
    if value > MAX_WINDOW {
        return Err(ConfigError::WindowTooLarge {
            name,
            value,
            max: MAX_WINDOW,
        });
    }
    Ok(())
}

// =============================================================================
// FeatureParams
// =============================================================================

/// Window lengths and constants for every indicator the composer applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureParams {
    /// Lags (in rows) for the `close_lag_{n}` columns.
    #[serde(default = "default_lags")]
    pub lags: Vec<usize>,

    #[serde(default = "default_sma_window")]
    pub sma_window: usize,

    #[serde(default = "default_ema_window")]
    pub ema_window: usize,

    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,

    /// Wilder RSI window.
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,

    /// ROC window; ROC is reported in percent.
    #[serde(default = "default_roc_window")]
    pub roc_window: usize,

    #[serde(default = "default_bb_window")]
    pub bb_window: usize,

    /// Standard-deviation multiplier for the Bollinger bands.
    #[serde(default = "default_bb_dev")]
    pub bb_dev: f64,

    /// Wilder ATR window.
    #[serde(default = "default_atr_window")]
    pub atr_window: usize,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            lags: default_lags(),
            sma_window: default_sma_window(),
            ema_window: default_ema_window(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
            rsi_window: default_rsi_window(),
            roc_window: default_roc_window(),
            bb_window: default_bb_window(),
            bb_dev: default_bb_dev(),
            atr_window: default_atr_window(),
        }
    }
}

impl FeatureParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let windows = [
            ("sma_window", self.sma_window),
            ("ema_window", self.ema_window),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("rsi_window", self.rsi_window),
            ("roc_window", self.roc_window),
            ("bb_window", self.bb_window),
            ("atr_window", self.atr_window),
        ];
        for (name, value) in windows {
            check_window(name, value)?;
        }
        let mut seen = HashSet::new();
        for &lag in &self.lags {
            check_window("lags", lag)?;
            if !seen.insert(lag) {
                return Err(ConfigError::DuplicateLag { lag });
            }
        }
        if self.macd_fast >= self.macd_slow {
            return Err(ConfigError::FastNotBelowSlow {
                fast: self.macd_fast,
                slow: self.macd_slow,
            });
        }
        if !(self.bb_dev.is_finite() && self.bb_dev > 0.0) {
            return Err(ConfigError::InvalidBandWidth { value: self.bb_dev });
        }
        Ok(())
    }

    /// Index of the first row at which every feature column can be defined.
    pub fn warm_up(&self) -> usize {
        let max_lag = self.lags.iter().copied().max().unwrap_or(0);
        [
            indicators::price::lookback(1),
            indicators::price::lookback(max_lag),
            indicators::sma::lookback(self.sma_window),
            indicators::ema::lookback(self.ema_window),
            indicators::macd::lookback(self.macd_fast, self.macd_slow, self.macd_signal),
            indicators::rsi::lookback(self.rsi_window),
            indicators::roc::lookback(self.roc_window),
            indicators::bollinger::lookback(self.bb_window),
            indicators::atr::lookback(self.atr_window),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }
}

// =============================================================================
// LabelParams
// =============================================================================

/// Forward-label settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelParams {
    /// Number of trading rows ahead used for `future_return`.
    #[serde(default = "default_horizon")]
    pub horizon: usize,
}

impl Default for LabelParams {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
        }
    }
}

// =============================================================================
// DatasetParams
// =============================================================================

/// File names and cutoff used by the `merge` and `split` commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetParams {
    #[serde(default = "default_merged_file")]
    pub merged_file: PathBuf,

    #[serde(default = "default_train_file")]
    pub train_file: PathBuf,

    #[serde(default = "default_test_file")]
    pub test_file: PathBuf,

    /// Rows dated strictly before this go to the train file, the rest to test.
    #[serde(default = "default_split_date")]
    pub split_date: NaiveDate,
}

impl Default for DatasetParams {
    fn default() -> Self {
        Self {
            merged_file: default_merged_file(),
            train_file: default_train_file(),
            test_file: default_test_file(),
            split_date: default_split_date(),
        }
    }
}

// =============================================================================
// PipelineConfig
// =============================================================================

/// Top-level configuration for one pipeline run.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding one raw OHLCV CSV per instrument.
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Directory receiving one structured CSV per instrument.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Instruments processed concurrently; 1 means strictly sequential.
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub features: FeatureParams,

    #[serde(default)]
    pub label: LabelParams,

    #[serde(default)]
    pub dataset: DatasetParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            workers: default_workers(),
            features: FeatureParams::default(),
            label: LabelParams::default(),
            dataset: DatasetParams::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pipeline config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse pipeline config from {}", path.display()))?;

        info!(
            path = %path.display(),
            input_dir = %config.input_dir.display(),
            output_dir = %config.output_dir.display(),
            horizon = config.label.horizon,
            "pipeline config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise pipeline config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "pipeline config saved (atomic)");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.features.validate()?;
        if self.label.horizon == 0 {
            return Err(ConfigError::ZeroHorizon);
        }
        check_window("horizon", self.label.horizon)?;
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }

    /// Fewest loaded rows that can still yield one complete labelled row.
    pub fn min_history(&self) -> usize {
        self.features
            .warm_up()
            .saturating_add(self.label.horizon)
            .saturating_add(1)
    }
}
