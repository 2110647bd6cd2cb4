//! Mock implementations of repository traits for testing.
//!
//! These mocks use in-memory storage and do not require a database connection.
//! Failure injection switches let tests drive the store-unavailable paths.

mod audit_repo;
mod staff_repo;

pub use audit_repo::MockAuditRepository;
pub use staff_repo::MockStaffRepository;
