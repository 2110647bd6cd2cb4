//! Audit log repository for database operations.

use super::{DbError, DbPool};
use crate::audit::{AuditEntry, AuditEvent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository trait for audit log persistence.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Appends an entry stamped with the current time.
    async fn record(
        &self,
        actor: &str,
        event: AuditEvent,
        detail: Option<&str>,
    ) -> Result<(), DbError>;

    /// Returns the most recent entries, newest first.
    async fn recent(&self, limit: u32) -> Result<Vec<AuditEntry>, DbError>;
}

/// SQLite implementation of AuditRepository.
pub struct SqliteAuditRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteAuditRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for SqliteAuditRepository {
    async fn record(
        &self,
        actor: &str,
        event: AuditEvent,
        detail: Option<&str>,
    ) -> Result<(), DbError> {
        let created_at = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO audit_log (actor, event, detail, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(actor)
        .bind(event.as_str())
        .bind(detail)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<AuditEntry>, DbError> {
        let rows: Vec<SqliteAuditRow> = sqlx::query_as(
            r#"
            SELECT id, actor, event, detail, created_at
            FROM audit_log
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

/// PostgreSQL implementation of AuditRepository.
pub struct PgAuditRepository {
    pool: sqlx::PgPool,
}

impl PgAuditRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PgAuditRepository {
    async fn record(
        &self,
        actor: &str,
        event: AuditEvent,
        detail: Option<&str>,
    ) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO audit_log (actor, event, detail, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(actor)
        .bind(event.as_str())
        .bind(detail)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<AuditEntry>, DbError> {
        let rows: Vec<PgAuditRow> = sqlx::query_as(
            r#"
            SELECT id, actor, event, detail, created_at
            FROM audit_log
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}

/// Creates an audit repository for the given pool.
pub fn create_audit_repository(pool: &DbPool) -> Box<dyn AuditRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteAuditRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgAuditRepository::new(pool.clone())),
    }
}

fn parse_event(event: &str) -> Result<AuditEvent, DbError> {
    event
        .parse()
        .map_err(|_| DbError::Serialization(format!("Invalid audit event: {}", event)))
}

#[derive(sqlx::FromRow)]
struct SqliteAuditRow {
    id: i64,
    actor: String,
    event: String,
    detail: Option<String>,
    created_at: String,
}

impl TryFrom<SqliteAuditRow> for AuditEntry {
    type Error = DbError;

    fn try_from(row: SqliteAuditRow) -> Result<Self, Self::Error> {
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| DbError::Serialization(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(AuditEntry {
            id: row.id,
            actor: row.actor,
            event: parse_event(&row.event)?,
            detail: row.detail,
            created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgAuditRow {
    id: i64,
    actor: String,
    event: String,
    detail: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<PgAuditRow> for AuditEntry {
    type Error = DbError;

    fn try_from(row: PgAuditRow) -> Result<Self, Self::Error> {
        Ok(AuditEntry {
            id: row.id,
            actor: row.actor,
            event: parse_event(&row.event)?,
            detail: row.detail,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::sqlite_pool;

    #[test]
    fn test_audit_row_conversion() {
        let row = SqliteAuditRow {
            id: 1,
            actor: "amy".to_string(),
            event: "credential_migrated".to_string(),
            detail: None,
            created_at: "2024-01-30T12:00:00+00:00".to_string(),
        };

        let entry: AuditEntry = row.try_into().unwrap();
        assert_eq!(entry.event, AuditEvent::CredentialMigrated);
    }

    #[test]
    fn test_audit_row_unknown_event() {
        let row = SqliteAuditRow {
            id: 1,
            actor: "amy".to_string(),
            event: "dropped_tables".to_string(),
            detail: None,
            created_at: "2024-01-30T12:00:00+00:00".to_string(),
        };

        let result: Result<AuditEntry, _> = row.try_into();
        assert!(matches!(result, Err(DbError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_recent_is_newest_first() {
        let pool = sqlite_pool().await;
        let repo = create_audit_repository(&pool);

        repo.record("amy", AuditEvent::LoginSucceeded, None)
            .await
            .unwrap();
        repo.record("amy", AuditEvent::LoggedOut, Some("manual"))
            .await
            .unwrap();

        let entries = repo.recent(10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event, AuditEvent::LoggedOut);
        assert_eq!(entries[0].detail.as_deref(), Some("manual"));

        assert_eq!(repo.recent(1).await.unwrap().len(), 1);
    }
}
