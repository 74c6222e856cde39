// =============================================================================
// ohlcv-features — Main Entry Point
// =============================================================================
//
// Raw daily OHLCV files in, one labelled feature table per instrument out.
// Configuration comes from a JSON file (defaults when absent), overridden per
// invocation by command-line flags.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod cli;
mod dataset;
mod error;
mod features;
mod indicators;
mod market_data;
mod pipeline;
mod runtime_config;
mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{BuildArgs, Cli, Command, InitConfigArgs, MergeArgs, SplitArgs};
use crate::pipeline::{Pipeline, RunReport};
use crate::runtime_config::PipelineConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    info!(version = env!("CARGO_PKG_VERSION"), "ohlcv-features starting");

    if let Command::InitConfig(args) = &cli.command {
        return init_config(&cli.config, args);
    }

    // ── 2. Config ────────────────────────────────────────────────────────
    let config = PipelineConfig::load(&cli.config).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        PipelineConfig::default()
    });

    // ── 3. Dispatch ──────────────────────────────────────────────────────
    match cli.command {
        Command::Build(args) => build(config, &args).await,
        Command::Merge(args) => merge(config, &args),
        Command::Split(args) => split(config, &args),
        Command::InitConfig(_) => Ok(()),
    }
}

async fn build(mut config: PipelineConfig, args: &BuildArgs) -> anyhow::Result<()> {
    args.apply(&mut config);
    let workers = config.workers;
    let pipeline = Pipeline::new(config).context("invalid pipeline configuration")?;

    let report = if workers > 1 {
        Arc::new(pipeline).run_parallel().await?
    } else {
        pipeline.run()?
    };

    if let Some(path) = &args.report {
        write_report(&report, path)?;
    }
    Ok(())
}

fn write_report(report: &RunReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialise run report")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write run report to {}", path.display()))?;
    info!(path = %path.display(), "run report written");
    Ok(())
}

fn merge(mut config: PipelineConfig, args: &MergeArgs) -> anyhow::Result<()> {
    args.apply(&mut config);
    dataset::merge_structured(&config.output_dir, &config.dataset.merged_file)?;
    Ok(())
}

fn split(mut config: PipelineConfig, args: &SplitArgs) -> anyhow::Result<()> {
    args.apply(&mut config);
    let ds = &config.dataset;
    dataset::split_by_date(&ds.merged_file, ds.split_date, &ds.train_file, &ds.test_file)?;
    Ok(())
}

fn init_config(path: &Path, args: &InitConfigArgs) -> anyhow::Result<()> {
    if path.exists() && !args.force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    PipelineConfig::default().save(path)
}
