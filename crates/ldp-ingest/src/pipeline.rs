//! Ingestion pipeline
//!
//! Coordinates catalog resolution, bounded-concurrency downloads, contract
//! validation, and committing of good resources. Two modes share the same
//! building blocks:
//!
//! - **Streaming** ([`IngestionPipeline::stream_to_csv`]): appends each
//!   passing resource to a single CSV artifact, one at a time, smoke-checking
//!   a row sample per file. Bad resources are skipped and logged; memory
//!   stays bounded by the concurrency window.
//! - **Batch** ([`IngestionPipeline::combine`]): fetches everything, unites
//!   the files into one in-memory table, and validates the whole result
//!   against the full contract. Any violation is fatal here, since the
//!   combined table is what a downstream sink consumes.
//!
//! The asymmetry is intentional: streaming trades per-row certainty (a bad
//! row outside the sample slips through) for bounded memory and fault
//! isolation; batch pays full-table validation cost for a complete
//! guarantee.
//!
//! Downloads run concurrently inside a fixed-width window while results are
//! consumed in catalog order, so validation and appending stay sequential in
//! resolution order and the output row order is deterministic. Dropping the
//! result stream on a fatal path cancels in-flight downloads.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use ldp_common::Settings;
use std::path::Path;
use tracing::{error, info, warn};

use crate::catalog::CatalogClient;
use crate::error::{IngestError, Result};
use crate::fetch::ResourceFetcher;
use crate::schema::SchemaContract;
use crate::table::Table;

/// How many skip reasons the run summary spells out
const SUMMARY_SKIP_LIMIT: usize = 5;

/// Pipeline knobs, fixed for the lifetime of one pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base URL of the catalog action API
    pub api_base_url: String,
    /// Dataset identifier to resolve
    pub dataset_id: String,
    /// Width of the concurrent download window
    pub max_concurrent_requests: usize,
    /// Rows smoke-checked per resource in streaming mode
    pub sample_rows: usize,
    /// Seed for the deterministic validation sample
    pub sample_seed: u64,
}

impl PipelineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_base_url: settings.api_base_url.clone(),
            dataset_id: settings.dataset_id.clone(),
            max_concurrent_requests: settings.max_concurrent_requests,
            sample_rows: settings.sample_rows,
            sample_seed: settings.sample_seed,
        }
    }
}

/// A resource that was excluded from the run, with the reason
#[derive(Debug, Clone)]
pub struct SkippedResource {
    pub url: String,
    pub reason: String,
}

/// Outcome of one pipeline invocation
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// Resources whose rows made it into the output
    pub committed: usize,
    /// Total rows committed
    pub rows_committed: u64,
    /// Resources excluded from the run
    pub skipped: Vec<SkippedResource>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// A fully validated combined dataset plus its run report
#[derive(Debug)]
pub struct CombinedDataset {
    pub table: Table,
    pub report: IngestReport,
}

/// Orchestrates fetch → validate → commit for one dataset
pub struct IngestionPipeline {
    catalog: CatalogClient,
    fetcher: ResourceFetcher,
    contract: SchemaContract,
    config: PipelineConfig,
}

impl IngestionPipeline {
    pub fn new(client: reqwest::Client, contract: SchemaContract, config: PipelineConfig) -> Self {
        Self {
            catalog: CatalogClient::new(client.clone(), config.api_base_url.clone()),
            fetcher: ResourceFetcher::new(client),
            contract,
            config,
        }
    }

    /// Streaming mode: fetch, smoke-check, and append resources one by one.
    ///
    /// The output file is recreated from scratch; its header row comes from
    /// the first committed resource, and later resources must match it.
    /// Per-resource failures are recorded as skips. A run that commits
    /// nothing fails with [`IngestError::EmptyResult`].
    pub async fn stream_to_csv(&self, output: &Path) -> Result<IngestReport> {
        let started_at = Utc::now();

        let urls = self.catalog.resolve(&self.config.dataset_id).await?;
        if urls.is_empty() {
            error!(dataset = %self.config.dataset_id, "no CSV URLs found, aborting");
            return Err(IngestError::EmptyCatalog(self.config.dataset_id.clone()));
        }

        match std::fs::remove_file(output) {
            Ok(()) => {},
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
            Err(e) => return Err(e.into()),
        }

        let mut committed = 0usize;
        let mut rows_committed = 0u64;
        let mut skipped: Vec<SkippedResource> = Vec::new();
        let mut header: Option<Vec<String>> = None;

        let fetcher = &self.fetcher;
        let mut results = futures::stream::iter(urls.into_iter().map(|url| async move {
            let table = fetcher.fetch(&url).await;
            (url, table)
        }))
        .buffered(self.config.max_concurrent_requests.max(1));

        while let Some((url, fetched)) = results.next().await {
            let Some(table) = fetched else {
                skipped.push(SkippedResource {
                    url,
                    reason: "download or parse failed".to_string(),
                });
                continue;
            };

            let narrowed = self.contract.narrowed_to(table.columns());
            if let Err(errors) =
                narrowed.validate_sample(&table, self.config.sample_rows, self.config.sample_seed)
            {
                warn!(url = %url, error = %errors, "validation failed for resource, skipping");
                skipped.push(SkippedResource {
                    url,
                    reason: format!("validation failed: {}", errors),
                });
                continue;
            }

            if let Some(expected) = &header {
                if table.columns() != expected.as_slice() {
                    warn!(url = %url, "resource columns do not match the established output header, skipping");
                    skipped.push(SkippedResource {
                        url,
                        reason: "columns incompatible with established output header".to_string(),
                    });
                    continue;
                }
            }

            let is_first = header.is_none();
            table.append_to_path(output, is_first)?;
            if is_first {
                header = Some(table.columns().to_vec());
            }

            info!(url = %url, rows = table.n_rows(), "appended resource to output");
            committed += 1;
            rows_committed += table.n_rows() as u64;
            // The table is released before the next resource leaves the
            // window, keeping peak memory at one window's worth of files.
            drop(table);
        }

        let report = IngestReport {
            committed,
            rows_committed,
            skipped,
            started_at,
            finished_at: Utc::now(),
        };

        if report.committed == 0 {
            self.log_summary(&report, "ingestion run committed nothing");
            return Err(IngestError::EmptyResult);
        }

        self.log_summary(&report, "ingestion run finished");
        info!(path = %output.display(), "all committed resources saved");
        Ok(report)
    }

    /// Batch mode: fetch everything, combine, validate the whole table.
    ///
    /// Individual fetch failures are tolerated until all of them fail;
    /// validation failures on the combined table are always fatal. The
    /// caller owns the returned dataset (e.g. to hand it to a sink).
    pub async fn combine(&self) -> Result<CombinedDataset> {
        let started_at = Utc::now();

        let urls = self.catalog.resolve(&self.config.dataset_id).await?;
        if urls.is_empty() {
            error!(dataset = %self.config.dataset_id, "no CSV URLs found, aborting");
            return Err(IngestError::EmptyCatalog(self.config.dataset_id.clone()));
        }

        let attempted = urls.len();
        let fetcher = &self.fetcher;
        let fetched: Vec<(String, Option<Table>)> =
            futures::stream::iter(urls.into_iter().map(|url| async move {
                let table = fetcher.fetch(&url).await;
                (url, table)
            }))
            .buffered(self.config.max_concurrent_requests.max(1))
            .collect()
            .await;

        let mut tables = Vec::new();
        let mut skipped = Vec::new();
        for (url, table) in fetched {
            match table {
                Some(table) => tables.push(table),
                None => skipped.push(SkippedResource {
                    url,
                    reason: "download or parse failed".to_string(),
                }),
            }
        }

        if tables.is_empty() {
            error!(attempted, "all CSV downloads failed, aborting");
            return Err(IngestError::AllFetchesFailed { attempted });
        }

        let combined = Table::concat(tables);
        info!(total_rows = combined.n_rows(), "combined all datasets");

        self.contract.validate(&combined)?;
        info!("combined dataset passed the schema contract");

        let report = IngestReport {
            committed: attempted - skipped.len(),
            rows_committed: combined.n_rows() as u64,
            skipped,
            started_at,
            finished_at: Utc::now(),
        };
        self.log_summary(&report, "combine run finished");

        Ok(CombinedDataset {
            table: combined,
            report,
        })
    }

    /// Human-readable run summary: counts plus the first few skip reasons.
    fn log_summary(&self, report: &IngestReport, message: &str) {
        info!(
            committed = report.committed,
            rows = report.rows_committed,
            skipped = report.skipped.len(),
            "{}",
            message
        );
        for skip in report.skipped.iter().take(SUMMARY_SKIP_LIMIT) {
            warn!(url = %skip.url, reason = %skip.reason, "resource skipped");
        }
        if report.skipped.len() > SUMMARY_SKIP_LIMIT {
            warn!(
                more = report.skipped.len() - SUMMARY_SKIP_LIMIT,
                "additional resources skipped"
            );
        }
    }
}
