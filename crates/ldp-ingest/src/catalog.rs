//! Resource catalog client
//!
//! Resolves a dataset identifier to the ordered list of downloadable CSV
//! resource URLs via the catalog's `package_show` action. Everything that
//! can go wrong here is fatal to a run, because without a resource list
//! there is nothing to ingest.

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{IngestError, Result};

/// Envelope returned by the catalog's `package_show` action
#[derive(Debug, Deserialize)]
struct PackageShowResponse {
    success: bool,
    #[serde(default)]
    result: Option<PackageResult>,
}

#[derive(Debug, Deserialize)]
struct PackageResult {
    #[serde(default)]
    resources: Vec<CatalogResource>,
}

#[derive(Debug, Deserialize)]
struct CatalogResource {
    #[serde(default)]
    format: Option<String>,
    url: String,
}

impl PackageShowResponse {
    /// URLs of resources in the target format, catalog order preserved
    fn urls_with_format(&self, format: &str) -> Vec<String> {
        self.result
            .as_ref()
            .map(|r| {
                r.resources
                    .iter()
                    .filter(|res| {
                        res.format
                            .as_deref()
                            .is_some_and(|f| f.eq_ignore_ascii_case(format))
                    })
                    .map(|res| res.url.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Client for the dataset metadata API
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Resolve a dataset identifier to its CSV resource URLs.
    ///
    /// Returns an empty list (not an error) when the lookup succeeds but no
    /// resource matches; the caller decides whether that is fatal. Transport
    /// failures, non-2xx statuses, and failure envelopes are all errors.
    pub async fn resolve(&self, dataset_id: &str) -> Result<Vec<String>> {
        let url = format!("{}/package_show", self.base_url);
        info!(url = %url, dataset = dataset_id, "fetching dataset metadata");

        let response = self
            .client
            .get(&url)
            .query(&[("id", dataset_id)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IngestError::Catalog(format!(
                "package_show returned HTTP {} for dataset '{}'",
                response.status(),
                dataset_id
            )));
        }

        let body: PackageShowResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Catalog(format!("unreadable package_show response: {}", e)))?;

        if !body.success {
            return Err(IngestError::Catalog(
                "API returned a failure response when fetching dataset details".to_string(),
            ));
        }

        let urls = body.urls_with_format("csv");
        if urls.is_empty() {
            warn!(dataset = dataset_id, "no CSV resources found in dataset");
        }

        info!(count = urls.len(), "retrieved CSV resource URLs");
        Ok(urls)
    }
}
