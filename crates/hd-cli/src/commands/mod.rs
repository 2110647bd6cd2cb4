//! CLI subcommand implementations.

pub mod migrate;
pub mod serve;
pub mod staff;

pub use migrate::run_migrate;
pub use serve::{run_server, ServeOverrides};
pub use staff::add_staff;

use anyhow::{Context, Result};
use hd_core::db::{create_pool_with_options, DbPool};

use crate::config::DatabaseConfig;

/// Opens the configured database.
pub(crate) async fn open_pool(database: &DatabaseConfig) -> Result<DbPool> {
    create_pool_with_options(&database.url, database.pool_options())
        .await
        .context("Failed to create database connection pool")
}
