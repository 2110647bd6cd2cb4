//! Staff command - provisions staff accounts.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use hd_core::auth::password::hash_password_with_cost;
use hd_core::db::create_staff_repository;
use hd_core::Role;
use std::io::BufRead;

use super::open_pool;
use crate::config::AppConfig;

/// Creates a staff account. The password is read from the first line of stdin
/// and stored as an Argon2 hash.
pub async fn add_staff(config: &AppConfig, username: &str, role: &str) -> Result<()> {
    let role: Role = role
        .parse()
        .map_err(|_| anyhow::anyhow!("Unknown role '{}'. Use admin or support", role))?;

    let username = username.trim();
    if username.is_empty() {
        bail!("Username must not be empty");
    }

    let mut password = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut password)
        .context("Failed to read password from stdin")?;
    let password = password.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("Password must not be empty");
    }

    let hash = hash_password_with_cost(password, &config.auth.hashing_cost())
        .context("Failed to hash password")?;

    let pool = open_pool(&config.database).await?;
    let staff = create_staff_repository(&pool)
        .create(username, role, &hash)
        .await
        .with_context(|| format!("Failed to create staff account '{}'", username))?;
    pool.close().await;

    println!(
        "  {} Created {} account '{}' (id {})",
        "✓".green(),
        staff.role,
        staff.username,
        staff.id
    );
    Ok(())
}
