//! Session storage backed by the portal database.
//!
//! Every visitor to the login form gets a session record, so records are
//! kept in the database and expired ones are purged on a timer.

use async_trait::async_trait;
use hd_core::db::{DbError, DbPool};
use std::time::Duration;
use tower_sessions::session::{Id, Record};
use tower_sessions::session_store::{self, ExpiredDeletion, SessionStore};
use tower_sessions_sqlx_store::{PostgresStore, SqliteStore};
use tracing::{debug, warn};

/// Default interval between purges of expired sessions.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Session store matching the backend of a [`DbPool`].
#[derive(Debug, Clone)]
pub enum PortalSessionStore {
    Sqlite(SqliteStore),
    Postgres(PostgresStore),
}

impl PortalSessionStore {
    /// Opens the session store on `db`, creating its table if needed.
    pub async fn connect(db: &DbPool) -> Result<Self, DbError> {
        let store = match db {
            DbPool::Sqlite(pool) => {
                let store = SqliteStore::new(pool.clone());
                store
                    .migrate()
                    .await
                    .map_err(|e| DbError::Migration(e.to_string()))?;
                PortalSessionStore::Sqlite(store)
            }
            DbPool::Postgres(pool) => {
                let store = PostgresStore::new(pool.clone());
                store
                    .migrate()
                    .await
                    .map_err(|e| DbError::Migration(e.to_string()))?;
                PortalSessionStore::Postgres(store)
            }
        };
        Ok(store)
    }
}

#[async_trait]
impl SessionStore for PortalSessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        match self {
            PortalSessionStore::Sqlite(store) => store.create(record).await,
            PortalSessionStore::Postgres(store) => store.create(record).await,
        }
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        match self {
            PortalSessionStore::Sqlite(store) => store.save(record).await,
            PortalSessionStore::Postgres(store) => store.save(record).await,
        }
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        match self {
            PortalSessionStore::Sqlite(store) => store.load(session_id).await,
            PortalSessionStore::Postgres(store) => store.load(session_id).await,
        }
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        match self {
            PortalSessionStore::Sqlite(store) => store.delete(session_id).await,
            PortalSessionStore::Postgres(store) => store.delete(session_id).await,
        }
    }
}

#[async_trait]
impl ExpiredDeletion for PortalSessionStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        match self {
            PortalSessionStore::Sqlite(store) => store.delete_expired().await,
            PortalSessionStore::Postgres(store) => store.delete_expired().await,
        }
    }
}

/// Purges expired sessions every `period` until the task is dropped.
///
/// A failed purge is logged and retried on the next tick. A zero period is
/// raised to one second.
pub async fn purge_expired_sessions(store: PortalSessionStore, period: Duration) {
    let mut interval = tokio::time::interval(period.max(Duration::from_secs(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match store.delete_expired().await {
            Ok(()) => debug!("Purged expired sessions"),
            Err(e) => warn!(error = %e, "Failed to purge expired sessions"),
        }
    }
}
