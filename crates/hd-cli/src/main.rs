//! Campus helpdesk CLI
//!
//! Runs the portal and manages its database and configuration.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use hd_observability::{init_logging_with_config, LoggingConfig};
use std::path::{Path, PathBuf};

mod commands;
mod config;
mod validator;

use commands::ServeOverrides;
use config::AppConfig;
use validator::ConfigValidator;

#[derive(Parser)]
#[command(name = "helpdesk")]
#[command(version)]
#[command(about = "Campus helpdesk portal", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "HELPDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the portal
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Database URL (sqlite: or postgres://)
        #[arg(short, long, env = "DATABASE_URL")]
        database: Option<String>,

        /// Validate configuration and exit without starting the server
        #[arg(long)]
        validate_only: bool,
    },

    /// Apply database migrations
    Migrate {
        /// Database URL (sqlite: or postgres://)
        #[arg(short, long, env = "DATABASE_URL")]
        database: Option<String>,
    },

    /// Validate configuration
    Validate {
        /// Configuration file to validate
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show current configuration
    Config {
        /// Show secrets (redacted by default)
        #[arg(long)]
        show_secrets: bool,
    },

    /// Manage staff accounts
    Staff {
        #[command(subcommand)]
        action: StaffCommands,
    },
}

#[derive(Subcommand)]
enum StaffCommands {
    /// Create a staff account, reading the password from stdin
    Add {
        /// Login name
        username: String,

        /// Role (admin or support)
        #[arg(short, long)]
        role: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) if config_path.exists() => return Err(e),
        Err(_) => {
            if cli.verbose {
                eprintln!("Using default configuration (no config file found)");
            }
            AppConfig::default()
        }
    };

    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let json = config.logging.json_format || cli.format == OutputFormat::Json;
    let logging = LoggingConfig::from_level(level, json).unwrap_or_else(|e| {
        eprintln!("{}: {}, falling back to info", "Logging".yellow(), e);
        LoggingConfig {
            json_format: json,
            ..LoggingConfig::default()
        }
    });
    init_logging_with_config(logging).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Serve {
            port,
            host,
            database,
            validate_only,
        } => {
            ServeOverrides {
                host,
                port,
                database_url: database,
            }
            .apply(&mut config);
            cmd_serve(config, validate_only).await
        }
        Commands::Migrate { database } => {
            if let Some(url) = database {
                config.database.url = url;
            }
            commands::run_migrate(&config.database).await
        }
        Commands::Validate { config: cfg_path } => cmd_validate(&cfg_path.unwrap_or(config_path)),
        Commands::Config { show_secrets } => cmd_config(config, show_secrets, cli.format),
        Commands::Staff {
            action: StaffCommands::Add { username, role },
        } => commands::add_staff(&config, &username, &role).await,
    }
}

fn default_config_path() -> PathBuf {
    if let Some(dirs) = directories::ProjectDirs::from("edu", "campus", "helpdesk") {
        dirs.config_dir().join("config.yaml")
    } else {
        PathBuf::from("config/default.yaml")
    }
}

async fn cmd_serve(config: AppConfig, validate_only: bool) -> Result<()> {
    println!("{}", "Validating configuration...".cyan());

    let validation_result = ConfigValidator::validate(&config);
    validation_result.print();

    if validation_result.has_errors() {
        println!();
        println!(
            "{}",
            "Server startup aborted due to configuration errors. Fix the errors above and try again."
                .red()
                .bold()
        );
        std::process::exit(1);
    }

    if validate_only {
        println!();
        println!(
            "{}",
            "Configuration is valid. Server can be started."
                .green()
                .bold()
        );
        return Ok(());
    }

    println!();
    commands::run_server(config).await
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!(
        "Validating configuration: {}",
        config_path.display().to_string().cyan()
    );

    let config = match AppConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("{}: {:#}", "Configuration file error".red().bold(), e);
            std::process::exit(1);
        }
    };

    let validation_result = ConfigValidator::validate(&config);
    validation_result.print();

    let redacted = config.redact_secrets();
    println!();
    println!("{}", "Configuration Summary".bold());
    println!("─────────────────────");
    println!("  Listen: {}:{}", redacted.server.host, redacted.server.port);
    println!("  Database: {}", redacted.database.url);
    println!(
        "  Hashing: m={} KiB, t={}, p={}",
        redacted.auth.memory_kib, redacted.auth.iterations, redacted.auth.parallelism
    );

    if validation_result.has_errors() {
        println!();
        println!(
            "{}",
            "Configuration validation failed. Fix the errors above."
                .red()
                .bold()
        );
        std::process::exit(1);
    } else if validation_result.has_warnings() {
        println!();
        println!(
            "{}",
            "Configuration is valid with warnings. Review the warnings above."
                .yellow()
                .bold()
        );
    } else {
        println!();
        println!("{}", "Configuration is valid.".green().bold());
    }

    Ok(())
}

fn cmd_config(config: AppConfig, show_secrets: bool, format: OutputFormat) -> Result<()> {
    let display_config = if show_secrets {
        config
    } else {
        config.redact_secrets()
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&display_config)?);
    } else {
        print!("{}", serde_yaml::to_string(&display_config)?);
    }

    Ok(())
}
