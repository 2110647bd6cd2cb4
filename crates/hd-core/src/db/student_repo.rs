//! Student roster repository.

use super::{DbError, DbPool};
use crate::ticket::Student;
use async_trait::async_trait;

#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Lists all students ordered by name.
    async fn list(&self) -> Result<Vec<Student>, DbError>;

    /// Adds a student to the roster.
    async fn create(&self, full_name: &str, email: &str, program: &str)
        -> Result<Student, DbError>;
}

pub struct SqliteStudentRepository {
    pool: sqlx::SqlitePool,
}

impl SqliteStudentRepository {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentRepository for SqliteStudentRepository {
    async fn list(&self) -> Result<Vec<Student>, DbError> {
        let rows: Vec<StudentRow> = sqlx::query_as(
            "SELECT id, full_name, email, program FROM students ORDER BY full_name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(
        &self,
        full_name: &str,
        email: &str,
        program: &str,
    ) -> Result<Student, DbError> {
        let result =
            sqlx::query("INSERT INTO students (full_name, email, program) VALUES (?, ?, ?)")
                .bind(full_name)
                .bind(email)
                .bind(program)
                .execute(&self.pool)
                .await?;

        Ok(Student {
            id: result.last_insert_rowid(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            program: program.to_string(),
        })
    }
}

pub struct PgStudentRepository {
    pool: sqlx::PgPool,
}

impl PgStudentRepository {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StudentRepository for PgStudentRepository {
    async fn list(&self) -> Result<Vec<Student>, DbError> {
        let rows: Vec<StudentRow> = sqlx::query_as(
            "SELECT id, full_name, email, program FROM students ORDER BY full_name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(
        &self,
        full_name: &str,
        email: &str,
        program: &str,
    ) -> Result<Student, DbError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO students (full_name, email, program) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(full_name)
        .bind(email)
        .bind(program)
        .fetch_one(&self.pool)
        .await?;

        Ok(Student {
            id,
            full_name: full_name.to_string(),
            email: email.to_string(),
            program: program.to_string(),
        })
    }
}

pub fn create_student_repository(pool: &DbPool) -> Box<dyn StudentRepository> {
    match pool {
        DbPool::Sqlite(pool) => Box::new(SqliteStudentRepository::new(pool.clone())),
        DbPool::Postgres(pool) => Box::new(PgStudentRepository::new(pool.clone())),
    }
}

#[derive(sqlx::FromRow)]
struct StudentRow {
    id: i64,
    full_name: String,
    email: String,
    program: String,
}

impl From<StudentRow> for Student {
    fn from(row: StudentRow) -> Self {
        Student {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            program: row.program,
        }
    }
}
