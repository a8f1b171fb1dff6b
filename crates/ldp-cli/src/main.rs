//! LDP - SBA loan data ingestion tool

use anyhow::Result;
use clap::{Parser, Subcommand};
use ldp_common::logging::{init_logging, LogConfig, LogLevel};
use ldp_common::Settings;
use tracing::info;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "ldp")]
#[command(author, version, about = "SBA loan data ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch all catalog CSVs and append them into one consolidated file
    Fetch(commands::fetch::FetchArgs),

    /// Fetch and combine all catalog CSVs, validating the full result
    Combine(commands::combine::CombineArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_config = LogConfig::from_env().unwrap_or_default();
    let log_config = if cli.verbose {
        log_config.with_level(LogLevel::Debug)
    } else {
        log_config
    };
    init_logging(&log_config)?;

    let settings = Settings::load()?;

    match cli.command {
        Command::Fetch(args) => {
            info!("Starting streaming ingestion");
            commands::fetch::run(settings, args).await?;
        },
        Command::Combine(args) => {
            info!("Starting combined ingestion");
            commands::combine::run(settings, args).await?;
        },
    }

    info!("Ingestion complete");
    Ok(())
}
