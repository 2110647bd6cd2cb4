//! Mock implementation of AuditRepository for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::audit::{AuditEntry, AuditEvent};
use crate::db::{AuditRepository, DbError};

/// In-memory audit log.
#[derive(Default)]
pub struct MockAuditRepository {
    entries: RwLock<Vec<AuditEntry>>,
    fail: AtomicBool,
}

impl MockAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with a connection error.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Entries in insertion order.
    pub async fn snapshot(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    /// Number of entries with the given event.
    pub async fn count(&self, event: AuditEvent) -> usize {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.event == event)
            .count()
    }

    fn check(&self) -> Result<(), DbError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DbError::Connection("injected audit failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuditRepository for MockAuditRepository {
    async fn record(
        &self,
        actor: &str,
        event: AuditEvent,
        detail: Option<&str>,
    ) -> Result<(), DbError> {
        self.check()?;
        let mut entries = self.entries.write().await;
        let id = entries.len() as i64 + 1;
        entries.push(AuditEntry {
            id,
            actor: actor.to_string(),
            event,
            detail: detail.map(str::to_string),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<AuditEntry>, DbError> {
        self.check()?;
        let entries = self.entries.read().await;
        Ok(entries.iter().rev().take(limit as usize).cloned().collect())
    }
}
