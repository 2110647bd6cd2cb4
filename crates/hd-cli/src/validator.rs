//! Configuration validation for the helpdesk.
//!
//! Runs before the server starts so that a bad hashing cost or database URL
//! is reported up front instead of on the first login.

use crate::config::AppConfig;
use colored::Colorize;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Critical errors that prevent startup.
    pub errors: Vec<String>,
    /// Warnings that should be addressed but don't prevent startup.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Prints the validation result to the console.
    pub fn print(&self) {
        if !self.warnings.is_empty() {
            println!();
            println!("{}", "Configuration Warnings:".yellow().bold());
            for warning in &self.warnings {
                println!("  {} {}", "⚠".yellow(), warning);
            }
        }

        if !self.errors.is_empty() {
            println!();
            println!("{}", "Configuration Errors:".red().bold());
            for error in &self.errors {
                println!("  {} {}", "✗".red(), error);
            }
        }

        if self.errors.is_empty() && self.warnings.is_empty() {
            println!("  {} Configuration OK", "✓".green());
        }
    }
}

/// Validates application configuration before startup.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &AppConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::validate_server(config, &mut result);
        Self::validate_database_url(config, &mut result);
        Self::validate_hashing_cost(config, &mut result);
        Self::validate_logging(config, &mut result);

        result
    }

    fn validate_server(config: &AppConfig, result: &mut ValidationResult) {
        let server = &config.server;

        if server.port == 0 {
            result.add_error("server.port must be between 1 and 65535");
        }
        if server.request_timeout_secs == 0 {
            result.add_error("server.request_timeout_secs must be greater than zero");
        }
        if server.session_expiry_secs == 0 {
            result.add_error("server.session_expiry_secs must be greater than zero");
        }
        if server.session_cleanup_secs == 0 {
            result.add_error("server.session_cleanup_secs must be greater than zero");
        }
        if server.session_cookie_name.trim().is_empty() {
            result.add_error("server.session_cookie_name must not be empty");
        }
        if !server.session_secure {
            result.add_warning(
                "server.session_secure is off. Session cookies will be sent over plain HTTP.",
            );
        }
    }

    /// Validates database URL format.
    fn validate_database_url(config: &AppConfig, result: &mut ValidationResult) {
        let url = &config.database.url;

        let supported = url.starts_with("sqlite:")
            || url.starts_with("postgres://")
            || url.starts_with("postgresql://");
        if !supported {
            result.add_error(format!(
                "Invalid database URL '{}'. Must start with sqlite: or postgres://",
                config.redact_secrets().database.url
            ));
        }

        if config.database.max_connections == 0 {
            result.add_error("database.max_connections must be greater than zero");
        }
    }

    fn validate_hashing_cost(config: &AppConfig, result: &mut ValidationResult) {
        let auth = &config.auth;

        if auth.memory_kib == 0 || auth.iterations == 0 || auth.parallelism == 0 {
            result.add_error("auth.memory_kib, auth.iterations and auth.parallelism must be non-zero");
            return;
        }
        if let Err(e) = auth.hashing_cost().validate() {
            result.add_error(format!("auth: {}", e));
        }
        if auth.store_timeout_secs == 0 {
            result.add_error("auth.store_timeout_secs must be greater than zero");
        }
        if auth.memory_kib < 19 * 1024 {
            result.add_warning(format!(
                "auth.memory_kib is {} KiB. New password hashes will be cheap to brute-force.",
                auth.memory_kib
            ));
        }
    }

    fn validate_logging(config: &AppConfig, result: &mut ValidationResult) {
        if let Err(e) =
            hd_observability::LoggingConfig::from_level(&config.logging.level, false)
        {
            result.add_error(format!("logging.level: {}", e));
        }
    }
}
