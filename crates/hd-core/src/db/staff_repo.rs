//! Staff account repository.

use super::{DbError, DbPool};
use crate::auth::{Credential, Role, StaffIdentity};
use async_trait::async_trait;

/// Result of a conditional credential write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialUpdate {
    /// The row still held the expected value and now holds the new one.
    Committed,
    /// The row no longer held the expected value. Nothing was written.
    Conflict,
}

/// Repository trait for staff account persistence.
#[async_trait]
pub trait StaffRepository: Send + Sync {
    /// Finds a staff account by its unique username.
    async fn get_by_username(&self, username: &str) -> Result<Option<StaffIdentity>, DbError>;

    /// Finds a staff account by id.
    async fn get(&self, id: i64) -> Result<Option<StaffIdentity>, DbError>;

    /// Provisions a staff account with the given stored password value.
    async fn create(
        &self,
        username: &str,
        role: Role,
        password: &str,
    ) -> Result<StaffIdentity, DbError>;

    /// Replaces the stored password only if it still equals `expected_old`.
    async fn update_credential(
        &self,
        id: i64,
        new_hash: &str,
        expected_old: &str,
    ) -> Result<CredentialUpdate, DbError>;
}

/// SQLite implementation of StaffRepository.
pub struct SqliteStaffRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteStaffRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StaffRepository for SqliteStaffRepository {
    async fn get_by_username(&self, username: &str) -> Result<Option<StaffIdentity>, DbError> {
        let row: Option<StaffRow> = sqlx::query_as(
            "SELECT id, username, role, password FROM staff_users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get(&self, id: i64) -> Result<Option<StaffIdentity>, DbError> {
        let row: Option<StaffRow> =
            sqlx::query_as("SELECT id, username, role, password FROM staff_users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create(
        &self,
        username: &str,
        role: Role,
        password: &str,
    ) -> Result<StaffIdentity, DbError> {
        let result =
            sqlx::query("INSERT INTO staff_users (username, role, password) VALUES (?, ?, ?)")
                .bind(username)
                .bind(role.as_str())
                .bind(password)
                .execute(&self.pool)
                .await?;

        Ok(StaffIdentity {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            role,
            credential: Credential::from_stored(password),
        })
    }

    async fn update_credential(
        &self,
        id: i64,
        new_hash: &str,
        expected_old: &str,
    ) -> Result<CredentialUpdate, DbError> {
        let result = sqlx::query("UPDATE staff_users SET password = ? WHERE id = ? AND password = ?")
            .bind(new_hash)
            .bind(id)
            .bind(expected_old)
            .execute(&self.pool)
            .await?;

        Ok(update_outcome(result.rows_affected()))
    }
}

/// PostgreSQL implementation of StaffRepository.
pub struct PgStaffRepository {
    pool: sqlx::PgPool,
}

impl PgStaffRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StaffRepository for PgStaffRepository {
    async fn get_by_username(&self, username: &str) -> Result<Option<StaffIdentity>, DbError> {
        let row: Option<StaffRow> = sqlx::query_as(
            "SELECT id, username, role, password FROM staff_users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn get(&self, id: i64) -> Result<Option<StaffIdentity>, DbError> {
        let row: Option<StaffRow> =
            sqlx::query_as("SELECT id, username, role, password FROM staff_users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create(
        &self,
        username: &str,
        role: Role,
        password: &str,
    ) -> Result<StaffIdentity, DbError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO staff_users (username, role, password) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(username)
        .bind(role.as_str())
        .bind(password)
        .fetch_one(&self.pool)
        .await?;

        Ok(StaffIdentity {
            id,
            username: username.to_string(),
            role,
            credential: Credential::from_stored(password),
        })
    }

    async fn update_credential(
        &self,
        id: i64,
        new_hash: &str,
        expected_old: &str,
    ) -> Result<CredentialUpdate, DbError> {
        let result =
            sqlx::query("UPDATE staff_users SET password = $1 WHERE id = $2 AND password = $3")
                .bind(new_hash)
                .bind(id)
                .bind(expected_old)
                .execute(&self.pool)
                .await?;

        Ok(update_outcome(result.rows_affected()))
    }
}

fn update_outcome(rows_affected: u64) -> CredentialUpdate {
    if rows_affected == 1 {
        CredentialUpdate::Committed
    } else {
        CredentialUpdate::Conflict
    }
}

/// Creates a staff repository for the given pool.
pub fn create_staff_repository(pool: &DbPool) -> Box<dyn StaffRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteStaffRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgStaffRepository::new(pool.clone())),
    }
}

// Both backends return the same column types for this table.
#[derive(sqlx::FromRow)]
struct StaffRow {
    id: i64,
    username: String,
    role: String,
    password: String,
}

impl TryFrom<StaffRow> for StaffIdentity {
    type Error = DbError;

    fn try_from(row: StaffRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|_| DbError::Serialization(format!("Invalid role: {}", row.role)))?;

        Ok(StaffIdentity {
            id: row.id,
            username: row.username,
            role,
            credential: Credential::from_stored(row.password),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::sqlite_pool;

    #[test]
    fn test_staff_row_conversion() {
        let row = StaffRow {
            id: 3,
            username: "amy".to_string(),
            role: "support".to_string(),
            password: "hunter2".to_string(),
        };

        let identity: StaffIdentity = row.try_into().unwrap();
        assert_eq!(identity.role, Role::Support);
        assert!(identity.credential.is_legacy());
    }

    #[test]
    fn test_staff_row_invalid_role() {
        let row = StaffRow {
            id: 3,
            username: "amy".to_string(),
            role: "superuser".to_string(),
            password: "hunter2".to_string(),
        };

        let result: Result<StaffIdentity, _> = row.try_into();
        assert!(matches!(result, Err(DbError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_conditional_update_sqlite() {
        let pool = sqlite_pool().await;
        let repo = create_staff_repository(&pool);

        let amy = repo.create("amy", Role::Support, "hunter2").await.unwrap();

        let first = repo
            .update_credential(amy.id, "$argon2id$first", "hunter2")
            .await
            .unwrap();
        assert_eq!(first, CredentialUpdate::Committed);

        // The expected value is stale now.
        let second = repo
            .update_credential(amy.id, "$argon2id$second", "hunter2")
            .await
            .unwrap();
        assert_eq!(second, CredentialUpdate::Conflict);

        let stored = repo.get_by_username("amy").await.unwrap().unwrap();
        assert_eq!(stored.credential, Credential::Hashed("$argon2id$first".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_username_is_constraint() {
        let pool = sqlite_pool().await;
        let repo = create_staff_repository(&pool);

        repo.create("amy", Role::Support, "hunter2").await.unwrap();
        let result = repo.create("amy", Role::Admin, "other").await;
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_lookup_missing() {
        let pool = sqlite_pool().await;
        let repo = create_staff_repository(&pool);

        assert!(repo.get_by_username("nosuchuser").await.unwrap().is_none());
        assert!(repo.get(42).await.unwrap().is_none());
    }
}
