//! Persisted audit trail of security and ticket events.

use crate::db::{AuditRepository, DbError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Kind of audited event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    LoginSucceeded,
    LoginFailed,
    CredentialMigrated,
    LoggedOut,
    TicketSubmitted,
    TicketStatusChanged,
}

impl AuditEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEvent::LoginSucceeded => "login_succeeded",
            AuditEvent::LoginFailed => "login_failed",
            AuditEvent::CredentialMigrated => "credential_migrated",
            AuditEvent::LoggedOut => "logged_out",
            AuditEvent::TicketSubmitted => "ticket_submitted",
            AuditEvent::TicketStatusChanged => "ticket_status_changed",
        }
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditEvent {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login_succeeded" => Ok(AuditEvent::LoginSucceeded),
            "login_failed" => Ok(AuditEvent::LoginFailed),
            "credential_migrated" => Ok(AuditEvent::CredentialMigrated),
            "logged_out" => Ok(AuditEvent::LoggedOut),
            "ticket_submitted" => Ok(AuditEvent::TicketSubmitted),
            "ticket_status_changed" => Ok(AuditEvent::TicketStatusChanged),
            _ => Err(()),
        }
    }
}

/// A stored audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    /// Username, or `anonymous` for public actions.
    pub actor: String,
    pub event: AuditEvent,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Best-effort writer for the audit log.
///
/// A failing or slow audit store is logged and never fails the caller.
#[derive(Clone)]
pub struct AuditTrail {
    repo: Option<Arc<dyn AuditRepository>>,
    timeout: Duration,
}

impl AuditTrail {
    pub fn new(repo: Arc<dyn AuditRepository>, timeout: Duration) -> Self {
        Self {
            repo: Some(repo),
            timeout,
        }
    }

    /// A trail that records nothing.
    pub fn disabled() -> Self {
        Self {
            repo: None,
            timeout: Duration::ZERO,
        }
    }

    pub async fn record(&self, actor: &str, event: AuditEvent, detail: Option<&str>) {
        let Some(repo) = &self.repo else {
            return;
        };

        let result = tokio::time::timeout(self.timeout, repo.record(actor, event, detail))
            .await
            .unwrap_or_else(|_| Err(DbError::Query("audit write timed out".to_string())));

        if let Err(e) = result {
            warn!(actor = %actor, event = %event, error = %e, "Failed to write audit entry");
        }
    }
}
