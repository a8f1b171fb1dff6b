//! LDP Common Library
//!
//! Shared ambient layer for the LDP workspace members:
//!
//! - **Logging**: tracing subscriber setup with env-based overrides
//! - **Settings**: application configuration loaded once at startup
//!
//! # Example
//!
//! ```no_run
//! use ldp_common::logging::{init_logging, LogConfig};
//! use ldp_common::settings::Settings;
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     let settings = Settings::load()?;
//!     tracing::info!(dataset = %settings.dataset_id, "starting up");
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod settings;

pub use settings::Settings;
