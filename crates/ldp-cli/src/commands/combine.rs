//! Combined ingestion command
//!
//! Fetches the whole catalog into memory, validates the combined dataset
//! against the full contract, and hands it to the requested destinations.

use anyhow::{Context, Result};
use clap::Args;
use ldp_common::Settings;
use ldp_ingest::{loan_smoke_contract, IngestionPipeline, PipelineConfig};
use std::path::PathBuf;
use tracing::info;

use super::{http_client, CatalogOpts};

#[derive(Args, Debug)]
pub struct CombineArgs {
    /// Write the combined dataset to this CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the combined dataset to the configured Postgres sink
    #[cfg(feature = "database")]
    #[arg(long)]
    pub to_database: bool,

    #[command(flatten)]
    pub catalog: CatalogOpts,
}

pub async fn run(mut settings: Settings, args: CombineArgs) -> Result<()> {
    args.catalog.apply(&mut settings);

    let pipeline = IngestionPipeline::new(
        http_client(&settings)?,
        loan_smoke_contract(),
        PipelineConfig::from_settings(&settings),
    );

    let combined = pipeline.combine().await?;

    if let Some(path) = &args.output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create data directory")?;
            }
        }
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        combined.table.write_csv(file, true)?;
        info!(
            rows = combined.table.n_rows(),
            path = %path.display(),
            "combined dataset written to CSV"
        );
    }

    #[cfg(feature = "database")]
    if args.to_database {
        use ldp_ingest::sink::PostgresSink;

        let db = settings
            .database
            .as_ref()
            .context("Database settings missing; set LDP_DATABASE__* variables")?;
        let sink = PostgresSink::connect(&db.connection_url()).await?;
        let written = sink.replace(&combined.table).await?;
        info!(rows = written, "combined dataset written to Postgres");
    }

    Ok(())
}
