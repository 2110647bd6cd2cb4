//! Ticket repository for database operations.

use super::{make_like_pattern, DbError, DbPool};
use crate::ticket::{NewTicket, Ticket, TicketStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Maximum rows returned by a public search.
pub const SEARCH_LIMIT: u32 = 50;

/// Repository trait for ticket persistence.
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Stores a new open ticket.
    async fn create(&self, ticket: &NewTicket) -> Result<Ticket, DbError>;

    /// Gets a ticket by id.
    async fn get(&self, id: i64) -> Result<Option<Ticket>, DbError>;

    /// Case-insensitive substring search over issue text.
    ///
    /// Wildcards in `query` match literally. A blank query matches nothing.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Ticket>, DbError>;

    /// Lists tickets, newest first, optionally restricted to one status.
    async fn list(&self, status: Option<TicketStatus>) -> Result<Vec<Ticket>, DbError>;

    /// Sets the status of a ticket. Returns false if no such ticket exists.
    async fn set_status(&self, id: i64, status: TicketStatus) -> Result<bool, DbError>;
}

/// SQLite implementation of TicketRepository.
pub struct SqliteTicketRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteTicketRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for SqliteTicketRepository {
    async fn create(&self, ticket: &NewTicket) -> Result<Ticket, DbError> {
        let created_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO tickets (student_id, issue, status, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(ticket.student_id)
        .bind(&ticket.issue)
        .bind(TicketStatus::Open.as_str())
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Ticket {
            id: result.last_insert_rowid(),
            student_id: ticket.student_id,
            issue: ticket.issue.clone(),
            status: TicketStatus::Open,
            created_at,
        })
    }

    async fn get(&self, id: i64) -> Result<Option<Ticket>, DbError> {
        let row: Option<SqliteTicketRow> = sqlx::query_as(
            "SELECT id, student_id, issue, status, created_at FROM tickets WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Ticket>, DbError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<SqliteTicketRow> = sqlx::query_as(
            r#"
            SELECT id, student_id, issue, status, created_at
            FROM tickets
            WHERE issue LIKE ? ESCAPE '\'
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(make_like_pattern(query.trim()))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list(&self, status: Option<TicketStatus>) -> Result<Vec<Ticket>, DbError> {
        let rows: Vec<SqliteTicketRow> = match status {
            Some(status) => {
                sqlx::query_as(
                    "SELECT id, student_id, issue, status, created_at FROM tickets WHERE status = ? ORDER BY id DESC",
                )
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id, student_id, issue, status, created_at FROM tickets ORDER BY id DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn set_status(&self, id: i64, status: TicketStatus) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE tickets SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// PostgreSQL implementation of TicketRepository.
pub struct PgTicketRepository {
    pool: sqlx::PgPool,
}

impl PgTicketRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TicketRepository for PgTicketRepository {
    async fn create(&self, ticket: &NewTicket) -> Result<Ticket, DbError> {
        let row: PgTicketRow = sqlx::query_as(
            r#"
            INSERT INTO tickets (student_id, issue, status, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, student_id, issue, status, created_at
            "#,
        )
        .bind(ticket.student_id)
        .bind(&ticket.issue)
        .bind(TicketStatus::Open.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get(&self, id: i64) -> Result<Option<Ticket>, DbError> {
        let row: Option<PgTicketRow> = sqlx::query_as(
            "SELECT id, student_id, issue, status, created_at FROM tickets WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Ticket>, DbError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<PgTicketRow> = sqlx::query_as(
            r#"
            SELECT id, student_id, issue, status, created_at
            FROM tickets
            WHERE issue ILIKE $1 ESCAPE '\'
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(make_like_pattern(query.trim()))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn list(&self, status: Option<TicketStatus>) -> Result<Vec<Ticket>, DbError> {
        let rows: Vec<PgTicketRow> = match status {
            Some(status) => {
                sqlx::query_as(
                    "SELECT id, student_id, issue, status, created_at FROM tickets WHERE status = $1 ORDER BY id DESC",
                )
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id, student_id, issue, status, created_at FROM tickets ORDER BY id DESC",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn set_status(&self, id: i64, status: TicketStatus) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE tickets SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Creates a ticket repository for the given pool.
pub fn create_ticket_repository(pool: &DbPool) -> Box<dyn TicketRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteTicketRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgTicketRepository::new(pool.clone())),
    }
}

fn parse_status(status: &str) -> Result<TicketStatus, DbError> {
    status
        .parse()
        .map_err(|_| DbError::Serialization(format!("Invalid ticket status: {}", status)))
}

#[derive(sqlx::FromRow)]
struct SqliteTicketRow {
    id: i64,
    student_id: i64,
    issue: String,
    status: String,
    created_at: String,
}

impl TryFrom<SqliteTicketRow> for Ticket {
    type Error = DbError;

    fn try_from(row: SqliteTicketRow) -> Result<Self, Self::Error> {
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| DbError::Serialization(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(Ticket {
            id: row.id,
            student_id: row.student_id,
            issue: row.issue,
            status: parse_status(&row.status)?,
            created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PgTicketRow {
    id: i64,
    student_id: i64,
    issue: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PgTicketRow> for Ticket {
    type Error = DbError;

    fn try_from(row: PgTicketRow) -> Result<Self, Self::Error> {
        Ok(Ticket {
            id: row.id,
            student_id: row.student_id,
            issue: row.issue,
            status: parse_status(&row.status)?,
            created_at: row.created_at,
        })
    }
}
