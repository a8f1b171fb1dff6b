//! LDP Ingest Library
//!
//! Concurrent fetch-validate-append ingestion of the SBA loan-dataset
//! catalog: resolve the catalog's CSV resources, download them with bounded
//! concurrency, smoke-check each file against a structural contract, and
//! assemble one consolidated dataset while tolerating per-resource failures.
//!
//! # Modes
//!
//! - **Streaming**: append passing files to one CSV artifact, sampled
//!   validation per file, bad files skipped
//! - **Batch**: combine everything in memory and validate the full result,
//!   for handoff to a persistence sink
//!
//! # Example
//!
//! ```no_run
//! use ldp_common::Settings;
//! use ldp_ingest::{loan_smoke_contract, IngestionPipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::default();
//!     let pipeline = IngestionPipeline::new(
//!         reqwest::Client::new(),
//!         loan_smoke_contract(),
//!         PipelineConfig::from_settings(&settings),
//!     );
//!     let report = pipeline.stream_to_csv(&settings.output_path()).await?;
//!     println!("committed {} resources", report.committed);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod schema;
#[cfg(feature = "database")]
pub mod sink;
pub mod table;

pub use error::{IngestError, Result};
pub use pipeline::{
    CombinedDataset, IngestReport, IngestionPipeline, PipelineConfig, SkippedResource,
};
pub use schema::loans::loan_smoke_contract;
pub use schema::{SchemaContract, SchemaErrors};
pub use table::Table;
