//! CLI command implementations

use anyhow::{Context, Result};
use clap::Args;
use ldp_common::Settings;
use std::time::Duration;

pub mod combine;
pub mod fetch;

/// Catalog overrides shared by every command
#[derive(Args, Debug)]
pub struct CatalogOpts {
    /// Override the catalog API base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Override the dataset identifier
    #[arg(long)]
    pub dataset: Option<String>,
}

impl CatalogOpts {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(url) = &self.base_url {
            settings.api_base_url = url.clone();
        }
        if let Some(id) = &self.dataset {
            settings.dataset_id = id.clone();
        }
    }
}

/// Shared HTTP client with the configured network timeout
pub fn http_client(settings: &Settings) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .user_agent("LDP-Loan-Ingester/0.1")
        .build()
        .context("Failed to build HTTP client")
}
