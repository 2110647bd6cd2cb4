//! Staff authentication and authorization.
//!
//! - [`Role`] and [`StaffIdentity`] model the provisioned staff accounts
//! - [`Credential`] distinguishes legacy plaintext from hashed passwords
//! - [`CredentialStore`] verifies passwords and migrates legacy records
//! - [`SessionGate`] turns verified credentials into sessions and checks access

pub mod credential_store;
pub mod password;
pub mod session_gate;

pub use credential_store::{CredentialStore, VerifyResult};
pub use session_gate::{AuthOutcome, SessionGate};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Staff role. There is no hierarchy between roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Manages the roster and reads the audit log.
    Admin,
    /// Works the ticket queue.
    Support,
}

impl Role {
    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Support => "support",
        }
    }

    /// Path a freshly authenticated session is sent to.
    pub fn landing_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Support => "/support",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "support" => Ok(Role::Support),
            _ => Err(()),
        }
    }
}

/// A stored password in one of its two forms.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Plaintext that has not been hashed yet.
    Legacy(String),
    /// Argon2 PHC string.
    Hashed(String),
}

impl Credential {
    /// Classifies a value read from the `password` column.
    pub fn from_stored(stored: impl Into<String>) -> Self {
        let stored = stored.into();
        if password::is_hashed(&stored) {
            Credential::Hashed(stored)
        } else {
            Credential::Legacy(stored)
        }
    }

    /// The value as it is persisted.
    pub fn as_stored(&self) -> &str {
        match self {
            Credential::Legacy(s) | Credential::Hashed(s) => s,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Credential::Legacy(_))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Legacy(_) => f.write_str("Legacy(<redacted>)"),
            Credential::Hashed(_) => f.write_str("Hashed(<redacted>)"),
        }
    }
}

/// A provisioned staff account.
#[derive(Debug, Clone)]
pub struct StaffIdentity {
    /// Immutable row id.
    pub id: i64,
    /// Login name (unique).
    pub username: String,
    pub role: Role,
    pub credential: Credential,
}

/// Logical fields of an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Staff id of the principal.
    pub staff_id: i64,
    /// Username (for display and audit).
    pub username: String,
    /// Role bound at login time.
    pub role: Role,
    /// CSRF token for form protection.
    pub csrf_token: String,
    /// When the session was established.
    pub established_at: DateTime<Utc>,
}

impl SessionData {
    /// Creates new session data with a fresh CSRF token.
    pub fn new(identity: &StaffIdentity) -> Self {
        Self {
            staff_id: identity.id,
            username: identity.username.clone(),
            role: identity.role,
            csrf_token: generate_token(),
            established_at: Utc::now(),
        }
    }
}

/// Generates a 32 character alphanumeric token from the OS RNG.
pub fn generate_token() -> String {
    use rand::rngs::OsRng;
    use rand::Rng;

    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    (0..32)
        .map(|_| CHARSET[OsRng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Session state as seen by the gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated(SessionData),
}

impl SessionState {
    pub fn data(&self) -> Option<&SessionData> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated(data) => Some(data),
        }
    }
}

impl From<Option<SessionData>> for SessionState {
    fn from(data: Option<SessionData>) -> Self {
        data.map_or(SessionState::Anonymous, SessionState::Authenticated)
    }
}

/// What a protected operation demands of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRequirement {
    /// Any authenticated staff member.
    AnyAuthenticated,
    /// Exactly this role.
    Role(Role),
}

impl fmt::Display for AccessRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessRequirement::AnyAuthenticated => f.write_str("any staff"),
            AccessRequirement::Role(role) => write!(f, "role {}", role),
        }
    }
}
