//! Password verification with migrate-on-read of legacy plaintext records.
//!
//! A record whose stored password is not an Argon2 PHC string is treated as
//! legacy plaintext. On the first verification attempt against such a record
//! the stored plaintext itself is hashed and written back with a conditional
//! update, and the presented password is then compared against the new hash.
//! The write is committed before any decision is returned, so a failed write
//! never authenticates and leaves the record legacy for the next attempt.
//!
//! An unknown username is checked against a placeholder hash at the same
//! cost, so it takes as long to reject as a wrong password.

use super::password::{hash_password_with_cost, verify_password, HashingCost, PasswordError};
use super::{generate_token, Credential, StaffIdentity};
use crate::audit::{AuditEvent, AuditTrail};
use crate::db::{CredentialUpdate, DbError, StaffRepository};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of [`CredentialStore::verify`].
#[derive(Debug, Clone)]
pub enum VerifyResult {
    Authenticated(StaffIdentity),
    NoSuchUser,
    InvalidCredential,
    /// The store failed or timed out. Retryable.
    StoreUnavailable,
}

#[derive(Debug, Error)]
enum CredentialError {
    #[error(transparent)]
    Store(#[from] DbError),

    #[error("store call exceeded {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Hashing(#[from] PasswordError),

    #[error("credential changed concurrently and the new value could not be read")]
    UnresolvedConflict,
}

/// Owns staff credential verification and the legacy migration.
pub struct CredentialStore {
    staff: Arc<dyn StaffRepository>,
    cost: HashingCost,
    store_timeout: Duration,
    audit: AuditTrail,
    placeholder_hash: OnceCell<String>,
}

impl CredentialStore {
    pub fn new(staff: Arc<dyn StaffRepository>, cost: HashingCost) -> Self {
        Self {
            staff,
            cost,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            audit: AuditTrail::disabled(),
            placeholder_hash: OnceCell::new(),
        }
    }

    /// Builds the placeholder hash used for unknown usernames.
    ///
    /// Called at startup so the first unknown username is not slower than
    /// later ones. Fails if Argon2 rejects the configured cost.
    pub async fn prepare(&self) -> Result<(), PasswordError> {
        match self.placeholder().await {
            Ok(_) => Ok(()),
            Err(CredentialError::Hashing(e)) => Err(e),
            Err(e) => Err(PasswordError::HashError(e.to_string())),
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Records completed migrations in the audit log.
    pub fn with_audit(mut self, audit: AuditTrail) -> Self {
        self.audit = audit;
        self
    }

    /// Verifies `presented` against the account named `username`.
    pub async fn verify(&self, username: &str, presented: &str) -> VerifyResult {
        match self.try_verify(username, presented).await {
            Ok(result) => result,
            Err(e) => {
                warn!(username = %username, error = %e, "Credential store unavailable");
                VerifyResult::StoreUnavailable
            }
        }
    }

    async fn try_verify(
        &self,
        username: &str,
        presented: &str,
    ) -> Result<VerifyResult, CredentialError> {
        let Some(identity) = self.call(self.staff.get_by_username(username)).await? else {
            self.reject_unknown(presented).await?;
            return Ok(VerifyResult::NoSuchUser);
        };

        let legacy = match &identity.credential {
            Credential::Legacy(plaintext) => Some(plaintext.clone()),
            Credential::Hashed(_) => None,
        };
        let identity = match legacy {
            Some(plaintext) => self.migrate(identity, plaintext).await?,
            None => identity,
        };

        self.compare(identity, presented).await
    }

    /// Hashes the stored plaintext and commits it before returning.
    async fn migrate(
        &self,
        identity: StaffIdentity,
        plaintext: String,
    ) -> Result<StaffIdentity, CredentialError> {
        let new_hash = self.hash(plaintext.clone()).await?;

        let outcome = self
            .call(
                self.staff
                    .update_credential(identity.id, &new_hash, &plaintext),
            )
            .await?;

        match outcome {
            CredentialUpdate::Committed => {
                info!(username = %identity.username, "Migrated legacy credential to hashed form");
                self.audit
                    .record(&identity.username, AuditEvent::CredentialMigrated, None)
                    .await;
                Ok(StaffIdentity {
                    credential: Credential::Hashed(new_hash),
                    ..identity
                })
            }
            CredentialUpdate::Conflict => {
                debug!(username = %identity.username, "Credential migrated concurrently, re-reading");
                match self.call(self.staff.get(identity.id)).await? {
                    Some(current)
                        if current.username == identity.username
                            && !current.credential.is_legacy() =>
                    {
                        Ok(current)
                    }
                    _ => Err(CredentialError::UnresolvedConflict),
                }
            }
        }
    }

    async fn compare(
        &self,
        identity: StaffIdentity,
        presented: &str,
    ) -> Result<VerifyResult, CredentialError> {
        let Credential::Hashed(hash) = &identity.credential else {
            return Ok(VerifyResult::InvalidCredential);
        };

        let hash = hash.clone();
        let presented = presented.to_string();
        let verified = tokio::task::spawn_blocking(move || verify_password(&presented, &hash))
            .await
            .map_err(|e| PasswordError::VerifyError(e.to_string()))?;

        match verified {
            Ok(true) => Ok(VerifyResult::Authenticated(identity)),
            Ok(false) => Ok(VerifyResult::InvalidCredential),
            Err(e) => {
                error!(username = %identity.username, error = %e, "Stored credential hash is unusable");
                Ok(VerifyResult::InvalidCredential)
            }
        }
    }

    /// Spends one Argon2 verification on a username with no record.
    async fn reject_unknown(&self, presented: &str) -> Result<(), CredentialError> {
        let hash = self.placeholder().await?.clone();
        let presented = presented.to_string();
        tokio::task::spawn_blocking(move || verify_password(&presented, &hash))
            .await
            .map_err(|e| PasswordError::VerifyError(e.to_string()))??;
        Ok(())
    }

    async fn placeholder(&self) -> Result<&String, CredentialError> {
        self.placeholder_hash
            .get_or_try_init(|| self.hash(generate_token()))
            .await
    }

    async fn hash(&self, secret: String) -> Result<String, CredentialError> {
        let cost = self.cost;
        let hash = tokio::task::spawn_blocking(move || hash_password_with_cost(&secret, &cost))
            .await
            .map_err(|e| PasswordError::HashError(e.to_string()))??;
        Ok(hash)
    }

    async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, DbError>>,
    ) -> Result<T, CredentialError> {
        tokio::time::timeout(self.store_timeout, fut)
            .await
            .map_err(|_| CredentialError::Timeout(self.store_timeout))?
            .map_err(CredentialError::from)
    }
}
