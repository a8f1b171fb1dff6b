//! Application settings
//!
//! Centralized configuration for the LDP tools. Values come from an optional
//! `ldp.toml` in the working directory, overridden by `LDP_*` environment
//! variables (nested keys separated by `__`, e.g. `LDP_DATABASE__USER`).
//! Loaded once at startup and passed by reference into the components that
//! need it.

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for settings operations
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Error raised when configuration cannot be loaded or parsed
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// Top-level application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Base URL of the catalog action API (package_show endpoint lives here)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Catalog identifier of the loan dataset
    #[serde(default = "default_dataset_id")]
    pub dataset_id: String,

    /// Directory for raw data artifacts
    #[serde(default = "default_raw_data_dir")]
    pub raw_data_dir: PathBuf,

    /// File name of the consolidated CSV inside `raw_data_dir`
    #[serde(default = "default_output_filename")]
    pub output_filename: String,

    /// Maximum number of in-flight resource downloads
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Timeout applied to every network operation, in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Number of rows smoke-checked per resource in streaming mode
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,

    /// Seed for the deterministic validation sample
    #[serde(default = "default_sample_seed")]
    pub sample_seed: u64,

    /// Optional Postgres sink connection settings
    #[serde(default)]
    pub database: Option<DatabaseSettings>,
}

/// Connection settings for the Postgres sink
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub user: String,
    pub password: String,
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    pub name: String,
}

impl DatabaseSettings {
    /// Build a Postgres connection URL from the individual parts
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

fn default_api_base_url() -> String {
    "https://data.sba.gov/api/3/action".to_string()
}

fn default_dataset_id() -> String {
    "7-a-504-foia".to_string()
}

fn default_raw_data_dir() -> PathBuf {
    PathBuf::from("data/raw")
}

fn default_output_filename() -> String {
    "sba_7a_loans_all_years.csv".to_string()
}

fn default_max_concurrent_requests() -> usize {
    5
}

fn default_http_timeout_secs() -> u64 {
    300
}

fn default_sample_rows() -> usize {
    1000
}

fn default_sample_seed() -> u64 {
    42
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            dataset_id: default_dataset_id(),
            raw_data_dir: default_raw_data_dir(),
            output_filename: default_output_filename(),
            max_concurrent_requests: default_max_concurrent_requests(),
            http_timeout_secs: default_http_timeout_secs(),
            sample_rows: default_sample_rows(),
            sample_seed: default_sample_seed(),
            database: None,
        }
    }
}

impl Settings {
    /// Load settings from `ldp.toml` (if present) and `LDP_*` environment
    /// variables, environment taking precedence.
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("ldp").required(false))
            .add_source(config::Environment::with_prefix("LDP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Full path of the consolidated output artifact
    pub fn output_path(&self) -> PathBuf {
        self.raw_data_dir.join(&self.output_filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api_base_url, "https://data.sba.gov/api/3/action");
        assert_eq!(settings.dataset_id, "7-a-504-foia");
        assert_eq!(settings.max_concurrent_requests, 5);
        assert_eq!(settings.http_timeout_secs, 300);
        assert_eq!(settings.sample_rows, 1000);
        assert_eq!(settings.sample_seed, 42);
        assert!(settings.database.is_none());
    }

    #[test]
    fn test_output_path() {
        let settings = Settings::default();
        assert_eq!(
            settings.output_path(),
            PathBuf::from("data/raw/sba_7a_loans_all_years.csv")
        );
    }

    #[test]
    fn test_database_connection_url() {
        let db = DatabaseSettings {
            user: "ldp".to_string(),
            password: "secret".to_string(),
            host: "db".to_string(),
            port: 5432,
            name: "loans".to_string(),
        };
        assert_eq!(db.connection_url(), "postgres://ldp:secret@db:5432/loans");
    }
}
