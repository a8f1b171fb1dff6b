//! Error types for loan-catalog ingestion
//!
//! Fatal conditions abort a whole run: the catalog lookup failing, no CSV
//! resources matching, every fetch failing in batch mode, or a run that
//! commits nothing. Per-resource fetch failures never appear here; the
//! fetcher swallows them (see `fetch`), and the pipeline records them as
//! skips.

use thiserror::Error;

use crate::schema::SchemaErrors;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error types for ingestion runs
#[derive(Debug, Error)]
pub enum IngestError {
    /// Catalog lookup transport failure
    #[error("catalog request failed: {0}")]
    Download(#[from] reqwest::Error),

    /// Catalog lookup returned a failure indicator or an unusable response
    #[error("catalog error: {0}")]
    Catalog(String),

    /// The catalog resolved successfully but no resource matched the target format
    #[error("no CSV resources found for dataset '{0}'")]
    EmptyCatalog(String),

    /// Batch mode: every resource fetch failed
    #[error("all {attempted} resource downloads failed")]
    AllFetchesFailed { attempted: usize },

    /// A run finished without committing any resource
    #[error("no valid resources were committed; output is empty")]
    EmptyResult,

    /// Schema contract violated (fatal in batch mode)
    #[error(transparent)]
    Validation(#[from] SchemaErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "database")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
