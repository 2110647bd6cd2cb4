//! Database layer for the helpdesk.
//!
//! Persistence for staff accounts, students, tickets and the audit log using
//! SQLx with support for both SQLite (development) and PostgreSQL (production).

mod error;
pub mod mocks;
mod pool;
mod schema;

pub mod audit_repo;
pub mod staff_repo;
pub mod student_repo;
pub mod ticket_repo;

pub use error::DbError;
pub use pool::{
    create_pool, create_pool_with_options, escape_like_pattern, make_like_pattern, DbPool,
    PoolOptions, Table,
};
pub use schema::run_migrations;

// Re-export repository traits and types
pub use audit_repo::AuditRepository;
pub use staff_repo::{CredentialUpdate, StaffRepository};
pub use student_repo::StudentRepository;
pub use ticket_repo::{TicketRepository, SEARCH_LIMIT};

// Re-export factory functions
pub use audit_repo::create_audit_repository;
pub use staff_repo::create_staff_repository;
pub use student_repo::create_student_repository;
pub use ticket_repo::create_ticket_repository;
