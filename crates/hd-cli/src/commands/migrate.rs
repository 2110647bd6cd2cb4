//! Migrate command - applies pending schema migrations.

use anyhow::{Context, Result};
use colored::Colorize;
use hd_core::db::run_migrations;

use super::open_pool;
use crate::config::DatabaseConfig;

pub async fn run_migrate(database: &DatabaseConfig) -> Result<()> {
    println!("{} Running migrations...", "[migrate]".cyan());

    let pool = open_pool(database).await?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    pool.close().await;

    println!("  {} Migrations complete ({})", "✓".green(), pool.db_type());
    Ok(())
}
