//! Mock implementation of StaffRepository for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use crate::auth::{Credential, Role, StaffIdentity};
use crate::db::{CredentialUpdate, DbError, StaffRepository};

/// In-memory staff table with failure injection.
///
/// `update_credential` has the same compare-and-set semantics as the SQL
/// implementations, so concurrent migrations race realistically.
#[derive(Default)]
pub struct MockStaffRepository {
    staff: RwLock<HashMap<i64, StaffIdentity>>,
    fail_lookups: AtomicBool,
    fail_updates: AtomicBool,
    delay: RwLock<Option<Duration>>,
    // Value another writer commits just before our next update lands.
    interloper: Mutex<Option<String>>,
    committed_updates: AtomicUsize,
}

impl MockStaffRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock repository pre-populated with staff accounts.
    pub fn with_staff(staff: Vec<StaffIdentity>) -> Self {
        let map = staff.into_iter().map(|s| (s.id, s)).collect();
        Self {
            staff: RwLock::new(map),
            ..Self::default()
        }
    }

    /// Makes lookups fail with a connection error.
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Makes credential updates fail with a connection error.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Delays every call by `delay`.
    pub async fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.write().await = delay;
    }

    /// Simulates a concurrent writer that stores `value` right before the
    /// next credential update is applied.
    pub async fn race_next_update_with(&self, value: impl Into<String>) {
        *self.interloper.lock().await = Some(value.into());
    }

    /// Number of updates that actually changed a row.
    pub fn committed_updates(&self) -> usize {
        self.committed_updates.load(Ordering::SeqCst)
    }

    /// Current state of an account.
    pub async fn snapshot(&self, username: &str) -> Option<StaffIdentity> {
        self.staff
            .read()
            .await
            .values()
            .find(|s| s.username == username)
            .cloned()
    }

    async fn pause(&self) {
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl StaffRepository for MockStaffRepository {
    async fn get_by_username(&self, username: &str) -> Result<Option<StaffIdentity>, DbError> {
        self.pause().await;
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(DbError::Connection("injected lookup failure".to_string()));
        }
        Ok(self.snapshot(username).await)
    }

    async fn get(&self, id: i64) -> Result<Option<StaffIdentity>, DbError> {
        self.pause().await;
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(DbError::Connection("injected lookup failure".to_string()));
        }
        Ok(self.staff.read().await.get(&id).cloned())
    }

    async fn create(
        &self,
        username: &str,
        role: Role,
        password: &str,
    ) -> Result<StaffIdentity, DbError> {
        let mut staff = self.staff.write().await;
        if staff.values().any(|s| s.username == username) {
            return Err(DbError::Constraint(format!(
                "Staff user '{}' already exists",
                username
            )));
        }

        let identity = StaffIdentity {
            id: staff.keys().max().copied().unwrap_or(0) + 1,
            username: username.to_string(),
            role,
            credential: Credential::from_stored(password),
        };
        staff.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn update_credential(
        &self,
        id: i64,
        new_hash: &str,
        expected_old: &str,
    ) -> Result<CredentialUpdate, DbError> {
        self.pause().await;
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(DbError::Connection("injected update failure".to_string()));
        }

        let mut staff = self.staff.write().await;
        let Some(identity) = staff.get_mut(&id) else {
            return Ok(CredentialUpdate::Conflict);
        };

        if let Some(value) = self.interloper.lock().await.take() {
            identity.credential = Credential::from_stored(value);
        }

        if identity.credential.as_stored() != expected_old {
            return Ok(CredentialUpdate::Conflict);
        }

        identity.credential = Credential::from_stored(new_hash);
        self.committed_updates.fetch_add(1, Ordering::SeqCst);
        Ok(CredentialUpdate::Committed)
    }
}
