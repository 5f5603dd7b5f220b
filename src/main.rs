use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use glyph_dataset::{
    application::{builder::DatasetBuilder, pipeline::FailurePolicy},
    config::StagingBackend,
    domain::value_objects::FormatTag,
    Config,
};

/// Decode ETL handwriting archives into PNG images and a JSON manifest
#[derive(Parser)]
#[command(name = "glyph-dataset", version, about, long_about = None)]
struct Cli {
    /// TOML config file; environment variables and flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the archive files
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for images and the manifest
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Archive family (8g or 9g)
    #[arg(short, long)]
    format: Option<FormatTag>,

    /// Output image width
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Output image height
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Staging backend (memory or disk)
    #[arg(long)]
    staging: Option<StagingBackend>,

    /// Failure policy (abort or collect)
    #[arg(long)]
    on_failure: Option<FailurePolicy>,

    /// Tab-separated code to label table
    #[arg(long)]
    labels: Option<PathBuf>,

    /// fsync images and staged batches
    #[arg(long)]
    durable: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<Config> {
        let base = match &self.config {
            Some(path) => Config::from_file(path).map_err(anyhow::Error::msg)?,
            None => Config::default(),
        };
        let mut config = base.with_env_overrides();

        if let Some(input) = self.input {
            config.input_dir = input;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if self.width.is_some() {
            config.output_width = self.width;
            config.output_height = self.height;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(staging) = self.staging {
            config.staging_backend = staging;
        }
        if let Some(policy) = self.on_failure {
            config.failure_policy = policy;
        }
        if let Some(labels) = self.labels {
            config.label_table = Some(labels);
        }
        if self.durable {
            config.durable_writes = true;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let config = Cli::parse().into_config()?;
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        "Configuration loaded: format {}, input {:?}, output {:?}, {} workers, {} staging",
        config.format,
        config.input_dir,
        config.output_dir,
        config.workers,
        config.staging_backend
    );

    let run = DatasetBuilder::new(config)
        .build()
        .context("Failed to prepare dataset run")?;

    let summary = run.run().await.map_err(|e| {
        error!("Dataset run failed ({:?}): {}", e.kind(), e);
        e
    })?;

    if summary.is_success() {
        info!("Manifest written to {:?}", summary.manifest_path);
        Ok(())
    } else {
        error!("{}", summary.details());
        anyhow::bail!("{} archives failed", summary.failures.len())
    }
}
