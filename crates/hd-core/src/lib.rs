//! # hd-core
//!
//! Core domain for the campus helpdesk.
//!
//! This crate owns staff identities and the migration of legacy plaintext
//! credentials to Argon2 hashes, the session gate that turns credentials into
//! role-bound sessions, and the persistence of tickets, students and the
//! audit trail.

pub mod audit;
pub mod auth;
pub mod db;
pub mod ticket;

pub use audit::{AuditEntry, AuditEvent, AuditTrail};
pub use ticket::{NewTicket, Student, Ticket, TicketStatus};

// Auth exports
pub use auth::password::{hash_password, verify_password, HashingCost, PasswordError};
pub use auth::session_gate::{INVALID_CREDENTIALS_MESSAGE, SERVICE_UNAVAILABLE_MESSAGE};
pub use auth::{
    AccessRequirement, AuthOutcome, Credential, CredentialStore, Role, SessionData, SessionGate,
    SessionState, StaffIdentity, VerifyResult,
};
