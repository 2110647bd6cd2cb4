//! Session establishment and role-based access checks.

use super::credential_store::{CredentialStore, VerifyResult};
use super::password::PasswordError;
use super::{AccessRequirement, SessionData, SessionState};
use crate::audit::{AuditEvent, AuditTrail};
use tracing::{info, warn};

/// Shown for both unknown usernames and wrong passwords.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password.";

/// Shown when the credential store cannot be reached.
pub const SERVICE_UNAVAILABLE_MESSAGE: &str =
    "Sign-in is temporarily unavailable. Please try again shortly.";

/// Outcome of a login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success(SessionData),
    InvalidCredentials,
    ServiceUnavailable,
}

impl AuthOutcome {
    /// User-visible message for a failed attempt.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            AuthOutcome::Success(_) => None,
            AuthOutcome::InvalidCredentials => Some(INVALID_CREDENTIALS_MESSAGE),
            AuthOutcome::ServiceUnavailable => Some(SERVICE_UNAVAILABLE_MESSAGE),
        }
    }
}

/// Gate between presented credentials and role-bound sessions.
pub struct SessionGate {
    credentials: CredentialStore,
    audit: AuditTrail,
}

impl SessionGate {
    pub fn new(credentials: CredentialStore, audit: AuditTrail) -> Self {
        Self { credentials, audit }
    }

    /// Readies the credential store before the first login.
    pub async fn prepare(&self) -> Result<(), PasswordError> {
        self.credentials.prepare().await
    }

    /// Verifies the credential pair and, on success, returns fresh session data.
    pub async fn authenticate(&self, username: &str, password: &str) -> AuthOutcome {
        match self.credentials.verify(username, password).await {
            VerifyResult::Authenticated(identity) => {
                info!(username = %identity.username, role = %identity.role, "Staff login succeeded");
                let detail = format!("role={}", identity.role);
                self.audit
                    .record(&identity.username, AuditEvent::LoginSucceeded, Some(&detail))
                    .await;
                AuthOutcome::Success(SessionData::new(&identity))
            }
            VerifyResult::NoSuchUser => {
                self.login_failed(username, "unknown user").await;
                AuthOutcome::InvalidCredentials
            }
            VerifyResult::InvalidCredential => {
                self.login_failed(username, "wrong password").await;
                AuthOutcome::InvalidCredentials
            }
            VerifyResult::StoreUnavailable => {
                warn!(username = %username, "Staff login aborted, credential store unavailable");
                AuthOutcome::ServiceUnavailable
            }
        }
    }

    async fn login_failed(&self, username: &str, reason: &str) {
        warn!(username = %username, reason, "Staff login failed");
        self.audit
            .record(username, AuditEvent::LoginFailed, Some(reason))
            .await;
    }

    /// Decides whether `session` satisfies `requirement`. Roles do not nest.
    pub fn authorize(&self, session: &SessionState, requirement: AccessRequirement) -> bool {
        match (session, requirement) {
            (SessionState::Anonymous, _) => false,
            (SessionState::Authenticated(_), AccessRequirement::AnyAuthenticated) => true,
            (SessionState::Authenticated(data), AccessRequirement::Role(role)) => data.role == role,
        }
    }

    /// Clears the session. Always succeeds.
    pub async fn logout(&self, session: &mut SessionState) {
        if let SessionState::Authenticated(data) = std::mem::take(session) {
            info!(username = %data.username, "Staff logged out");
            self.audit
                .record(&data.username, AuditEvent::LoggedOut, None)
                .await;
        }
    }
}
