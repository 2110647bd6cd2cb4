//! Serve command - starts the portal.

use anyhow::{Context, Result};
use colored::Colorize;
use std::net::SocketAddr;
use std::time::Duration;

use hd_api::{ApiServer, ApiServerConfig, AppState, GateSettings, PortalSessionStore};
use hd_core::db::run_migrations;

use super::open_pool;
use crate::config::AppConfig;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ServeOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_url: Option<String>,
}

impl ServeOverrides {
    pub fn apply(self, config: &mut AppConfig) {
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = self.database_url {
            config.database.url = url;
        }
    }
}

/// Runs the portal until shutdown.
pub async fn run_server(config: AppConfig) -> Result<()> {
    println!("{} Starting helpdesk portal...", "[server]".cyan());

    let shown_url = config.redact_secrets().database.url;
    println!("  {} Database: {}", "→".green(), shown_url);
    let db_pool = open_pool(&config.database).await?;

    println!("  {} Running migrations...", "→".green());
    run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;
    println!("  {} Migrations complete", "✓".green());

    let settings = GateSettings {
        hashing_cost: config.auth.hashing_cost(),
        store_timeout: config.auth.store_timeout(),
    };
    let sessions = PortalSessionStore::connect(&db_pool)
        .await
        .context("Failed to prepare session storage")?;
    let state = AppState::new(db_pool, settings);
    state
        .gate
        .prepare()
        .await
        .context("Invalid hashing cost")?;

    let bind_address: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    let server_config = ApiServerConfig {
        bind_address,
        request_timeout: Duration::from_secs(config.server.request_timeout_secs),
        session_cookie_name: config.server.session_cookie_name.clone(),
        session_expiry: Duration::from_secs(config.server.session_expiry_secs),
        session_secure: config.server.session_secure,
        session_cleanup_interval: Duration::from_secs(config.server.session_cleanup_secs),
    };

    println!();
    println!("{}", "Campus Helpdesk".bold());
    println!("{}", "═".repeat(40));
    println!("  {} http://{}", "Address:".cyan(), bind_address);
    println!("  {} {}", "Database:".cyan(), shown_url);
    println!();
    println!("{}", "Endpoints:".bold());
    println!("  GET  /                       - Portal (login, ticket, search)");
    println!("  POST /submit_ticket          - File a ticket");
    println!("  GET  /search?q=              - Search tickets");
    println!("  GET  /admin                  - Admin overview");
    println!("  GET  /support                - Support queue");
    println!("  GET  /tickets                - Ticket list");
    println!("  GET  /health                 - Health check");
    println!();
    println!("Press {} to stop", "Ctrl+C".yellow());
    println!();

    let server = ApiServer::new(state, sessions, server_config);
    server.run().await.context("Server error")?;

    println!();
    println!("{} Server stopped", "[server]".cyan());

    Ok(())
}
