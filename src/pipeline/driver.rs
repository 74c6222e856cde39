// =============================================================================
// Pipeline Driver — LOAD -> COMPOSE -> LABEL -> FINALIZE -> WRITE
// =============================================================================
//
// One instrument per input file. Each instrument is processed from its own
// file into its own output file with no state shared between instruments, so
// the sequential and parallel runs produce byte-identical outputs.
//
// Failure handling:
//   * empty input / missing columns / short history => Skipped (warn)
//   * unreadable or corrupt input, panics           => Failed  (error)
//   * output directory unusable                     => whole run aborts
//
// Parallel mode hands each instrument to `spawn_blocking`, bounded by a
// semaphore of `workers` permits, and reports results in input-file order.
// After a fatal error no new instrument starts, and every task already
// started is awaited before the error is returned.
// =============================================================================

use std::any::Any;
use std::collections::HashSet;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::error::{ConfigError, FeatureError, LoadError, PipelineError};
use crate::features::{self, FeatureTable};
use crate::market_data::{self, LoadReport, PriceSeries};
use crate::pipeline::report::{InstrumentOutcome, InstrumentStatus, RunReport};
use crate::pipeline::writer;
use crate::runtime_config::PipelineConfig;
use crate::types::{is_csv_path, AssetId};

/// One discovered input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    pub asset: AssetId,
    pub path: PathBuf,
}

/// Input files split into unique instruments and name collisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub inputs: Vec<InputFile>,
    /// Files whose asset identifier was already taken by an earlier file.
    pub duplicates: Vec<InputFile>,
}

/// Feature pipeline bound to one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Validate `config` and build a pipeline around it.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    // -------------------------------------------------------------------------
    // In-memory core
    // -------------------------------------------------------------------------

    /// Compose, label and finalize one loaded series.
    ///
    /// Fails with `InsufficientHistory` when the series cannot produce a
    /// single complete row.
    pub fn build_table(&self, series: &PriceSeries) -> Result<FeatureTable, FeatureError> {
        let required = self.config.min_history();
        if series.len() < required {
            return Err(FeatureError::InsufficientHistory {
                rows: series.len(),
                required,
            });
        }

        let mut frame = features::compose(series, &self.config.features);
        features::apply_labels(&mut frame, &self.config.label);
        let table = frame.finalize();

        if table.is_empty() {
            return Err(FeatureError::InsufficientHistory {
                rows: series.len(),
                required,
            });
        }
        debug!(
            asset = %series.asset,
            input_rows = series.len(),
            output_rows = table.len(),
            "feature table finalized"
        );
        Ok(table)
    }

    /// Load the file at `path` and build its feature table.
    pub fn build_from_file(&self, path: &Path) -> Result<(FeatureTable, LoadReport), PipelineError> {
        let (series, load) = market_data::load_series(path)?;
        let table = self.build_table(&series)?;
        Ok((table, load))
    }

    // -------------------------------------------------------------------------
    // Filesystem driver
    // -------------------------------------------------------------------------

    /// List `*.csv` files in the input directory, sorted by file name.
    pub fn discover(&self) -> Result<Discovery, PipelineError> {
        let dir = &self.config.input_dir;
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir).map_err(LoadError::Io)? {
            let path = entry.map_err(LoadError::Io)?.path();
            if path.is_file() && is_csv_path(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut seen = HashSet::new();
        let mut discovery = Discovery::default();
        for path in paths {
            let Some(asset) = AssetId::from_path(&path) else {
                continue;
            };
            let file = InputFile { asset, path };
            if seen.insert(file.asset.clone()) {
                discovery.inputs.push(file);
            } else {
                discovery.duplicates.push(file);
            }
        }
        Ok(discovery)
    }

    fn prepare_output(&self) -> Result<(), PipelineError> {
        let dir = &self.config.output_dir;
        fs::create_dir_all(dir).map_err(|source| PipelineError::Output {
            path: dir.clone(),
            source,
        })
    }

    /// Run one instrument to its terminal state.
    ///
    /// Only an output failure is returned as `Err`; every other problem is
    /// folded into the outcome.
    pub fn process(&self, input: &InputFile) -> Result<InstrumentOutcome, PipelineError> {
        let asset = &input.asset;
        let (status, load) = match self.build_from_file(&input.path) {
            Ok((table, load)) => {
                let path = writer::write_table(&table, &self.config.output_dir).map_err(|source| {
                    PipelineError::Output {
                        path: self.config.output_dir.join(asset.output_file_name()),
                        source,
                    }
                })?;
                info!(
                    asset = %asset,
                    rows = table.len(),
                    kept = load.kept(),
                    dropped = load.malformed + load.duplicates,
                    path = %path.display(),
                    "instrument written"
                );
                (
                    InstrumentStatus::Written {
                        rows: table.len(),
                        path,
                    },
                    Some(load),
                )
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) if e.is_skip() => {
                warn!(asset = %asset, reason = %e, "instrument skipped");
                (InstrumentStatus::Skipped { reason: e.to_string() }, None)
            }
            Err(e) => {
                error!(asset = %asset, error = %e, "instrument failed");
                (InstrumentStatus::Failed { reason: e.to_string() }, None)
            }
        };

        Ok(InstrumentOutcome {
            asset: asset.to_string(),
            source: input.path.clone(),
            status,
            load,
        })
    }

    /// `process`, with a panic turned into a `Failed` outcome.
    fn process_isolated(&self, input: &InputFile) -> Result<InstrumentOutcome, PipelineError> {
        panic::catch_unwind(AssertUnwindSafe(|| self.process(input)))
            .unwrap_or_else(|payload| Ok(Self::panicked_outcome(input, &*payload)))
    }

    fn panicked_outcome(input: &InputFile, payload: &(dyn Any + Send)) -> InstrumentOutcome {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        let reason = format!("panicked: {message}");
        error!(asset = %input.asset, error = %reason, "instrument failed");
        InstrumentOutcome {
            asset: input.asset.to_string(),
            source: input.path.clone(),
            status: InstrumentStatus::Failed { reason },
            load: None,
        }
    }

    fn duplicate_outcome(file: &InputFile) -> InstrumentOutcome {
        let err = PipelineError::DuplicateAsset {
            asset: file.asset.to_string(),
        };
        error!(asset = %file.asset, path = %file.path.display(), error = %err, "instrument failed");
        InstrumentOutcome {
            asset: file.asset.to_string(),
            source: file.path.clone(),
            status: InstrumentStatus::Failed { reason: err.to_string() },
            load: None,
        }
    }

    /// Process every input file one after another.
    pub fn run(&self) -> Result<RunReport, PipelineError> {
        let discovery = self.discover()?;
        self.prepare_output()?;
        info!(
            instruments = discovery.inputs.len(),
            input_dir = %self.config.input_dir.display(),
            "processing instruments sequentially"
        );

        let mut report = RunReport::default();
        for input in &discovery.inputs {
            report.push(self.process_isolated(input)?);
        }
        for file in &discovery.duplicates {
            report.push(Self::duplicate_outcome(file));
        }

        report.log_summary();
        Ok(report)
    }

    /// Process input files concurrently on the blocking thread pool.
    ///
    /// Outcomes are reported in the same order as [`Pipeline::run`].
    pub async fn run_parallel(self: Arc<Self>) -> Result<RunReport, PipelineError> {
        let discovery = self.discover()?;
        self.prepare_output()?;
        info!(
            instruments = discovery.inputs.len(),
            workers = self.config.workers,
            input_dir = %self.config.input_dir.display(),
            "processing instruments in parallel"
        );

        let permits = Arc::new(Semaphore::new(self.config.workers));
        let halted = Arc::new(AtomicBool::new(false));
        let mut handles = Vec::with_capacity(discovery.inputs.len());
        for input in discovery.inputs {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .expect("run semaphore is never closed");
            if halted.load(Ordering::Acquire) {
                break;
            }
            let pipeline = Arc::clone(&self);
            let halted = Arc::clone(&halted);
            let job = input.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                if halted.load(Ordering::Acquire) {
                    return None;
                }
                let result = pipeline.process_isolated(&job);
                if result.is_err() {
                    halted.store(true, Ordering::Release);
                }
                Some(result)
            });
            handles.push((input, handle));
        }

        // Await every handle, even after a fatal error, so that no task is
        // still writing once this returns.
        let mut report = RunReport::default();
        let mut fatal: Option<PipelineError> = None;
        for (input, handle) in handles {
            let joined = handle.await;
            if fatal.is_some() {
                continue;
            }
            match joined {
                Ok(Some(Ok(outcome))) => report.push(outcome),
                Ok(Some(Err(e))) => {
                    warn!(error = %e, "fatal error, waiting for running instruments before stopping");
                    fatal = Some(e);
                }
                // Halted before starting; the fatal error is in a later handle.
                Ok(None) => {}
                Err(join_err) if join_err.is_panic() => {
                    report.push(Self::panicked_outcome(&input, &*join_err.into_panic()));
                }
                Err(join_err) => {
                    error!(asset = %input.asset, error = %join_err, "instrument task aborted");
                    report.push(InstrumentOutcome {
                        asset: input.asset.to_string(),
                        source: input.path,
                        status: InstrumentStatus::Failed {
                            reason: format!("task aborted: {join_err}"),
                        },
                        load: None,
                    });
                }
            }
        }
        if let Some(e) = fatal {
            return Err(e);
        }

        for file in &discovery.duplicates {
            report.push(Self::duplicate_outcome(file));
        }

        report.log_summary();
        Ok(report)
    }
}
