//! Application state shared across handlers.

use hd_core::auth::credential_store::DEFAULT_STORE_TIMEOUT;
use hd_core::db::{create_audit_repository, create_staff_repository, DbPool};
use hd_core::{AuditTrail, CredentialStore, HashingCost, SessionGate};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Settings for the credential store, fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct GateSettings {
    /// Argon2 cost for newly written hashes.
    pub hashing_cost: HashingCost,
    /// Bound on each store call made while authenticating.
    pub store_timeout: Duration,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            hashing_cost: HashingCost::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DbPool>,
    /// Authentication and authorization gate.
    pub gate: Arc<SessionGate>,
    /// Audit log writer for ticket events.
    pub audit: AuditTrail,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(db: DbPool, settings: GateSettings) -> Self {
        let audit = AuditTrail::new(
            Arc::from(create_audit_repository(&db)),
            settings.store_timeout,
        );
        let credentials = CredentialStore::new(
            Arc::from(create_staff_repository(&db)),
            settings.hashing_cost,
        )
        .with_store_timeout(settings.store_timeout)
        .with_audit(audit.clone());

        info!(
            db_type = db.db_type(),
            memory_kib = settings.hashing_cost.memory_kib,
            iterations = settings.hashing_cost.iterations,
            "Session gate initialized"
        );

        Self {
            db: Arc::new(db),
            gate: Arc::new(SessionGate::new(credentials, audit.clone())),
            audit,
        }
    }
}
