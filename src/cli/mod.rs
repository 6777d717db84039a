//! CLI module for the product catalog
//!
//! Subcommands:
//! - `serve`: HTTP API server (default deployment mode)
//! - `migrate`: apply, inspect or revert the product store schema

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Product catalog - Postgres-backed store with a write-through cache
#[derive(Parser)]
#[command(name = "product-catalog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve,

    /// Manage database migrations
    Migrate(migrate::MigrateArgs),
}

/// Loads `.env` and the layered configuration, then installs logging
pub(crate) fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    Ok(config)
}
