//! Per-resource CSV fetcher
//!
//! Streams one resource's bytes fully into memory and parses them as a
//! headed CSV table. Failures here are deliberately not errors: a resource
//! that cannot be produced (bad status, transport fault, unparseable body)
//! is logged and reported as `None` so one broken file can never abort the
//! batch. Retry policy, if any, belongs to the caller.

use futures::StreamExt;
use tracing::{error, info};

use crate::table::Table;

/// Downloads and parses individual catalog resources
pub struct ResourceFetcher {
    client: reqwest::Client,
}

impl ResourceFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch one resource; `None` means "this resource could not be produced".
    pub async fn fetch(&self, url: &str) -> Option<Table> {
        info!(url = %url, "downloading CSV resource");

        match self.try_fetch(url).await {
            Ok(table) => {
                info!(url = %url, rows = table.n_rows(), "downloaded and parsed CSV");
                Some(table)
            },
            Err(err) => {
                error!(url = %url, error = %err, "failed to produce CSV resource");
                None
            },
        }
    }

    async fn try_fetch(&self, url: &str) -> anyhow::Result<Table> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP {} downloading resource", response.status());
        }

        let mut body = Vec::new();
        if let Some(len) = response.content_length() {
            body.reserve(len as usize);
        }

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk?);
        }

        Ok(Table::from_csv(body.as_slice())?)
    }
}
