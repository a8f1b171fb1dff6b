//! Streaming fetch command
//!
//! Downloads every CSV in the loan catalog, smoke-checks each file, and
//! appends the good ones into one consolidated CSV.

use anyhow::{Context, Result};
use clap::Args;
use ldp_common::Settings;
use ldp_ingest::{loan_smoke_contract, IngestionPipeline, PipelineConfig};
use std::path::PathBuf;
use tracing::info;

use super::{http_client, CatalogOpts};

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Skip the run entirely when the output file already exists
    #[arg(long)]
    pub skip: bool,

    /// Output file path (defaults to the configured data directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub catalog: CatalogOpts,
}

pub async fn run(mut settings: Settings, args: FetchArgs) -> Result<()> {
    args.catalog.apply(&mut settings);

    let output = args.output.unwrap_or_else(|| settings.output_path());

    if args.skip && output.exists() {
        info!(path = %output.display(), "final dataset already exists, skipping run");
        return Ok(());
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
        }
    }

    let pipeline = IngestionPipeline::new(
        http_client(&settings)?,
        loan_smoke_contract(),
        PipelineConfig::from_settings(&settings),
    );

    let report = pipeline.stream_to_csv(&output).await?;
    info!(
        committed = report.committed,
        rows = report.rows_committed,
        skipped = report.skipped.len(),
        path = %output.display(),
        "fetch finished"
    );
    Ok(())
}
