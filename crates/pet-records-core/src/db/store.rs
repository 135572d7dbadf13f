//! [`RecordRepository`] and [`ActivityLog`] backed by SQLite.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{Database, DbError};
use crate::models::{ActivityEntry, RecordKind, StoredRecord};
use crate::store::{ActivityLog, RecordRepository, RepoResult, RepositoryError};

impl From<DbError> for RepositoryError {
    fn from(e: DbError) -> Self {
        if e.is_constraint() {
            return RepositoryError::Constraint(e.to_string());
        }
        match e {
            DbError::NotFound(what) => RepositoryError::NotFound(format!("Record not found: {}", what)),
            other => RepositoryError::Backend(other.to_string()),
        }
    }
}

/// Shared handle over one SQLite connection.
///
/// Calls run synchronously on the caller's task; the connection is guarded by
/// a mutex so the store can be shared between forms and advisors.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Shared database handle, for pet and activity queries.
    pub fn database(&self) -> Arc<Mutex<Database>> {
        Arc::clone(&self.db)
    }

    pub(crate) fn lock(&self) -> RepoResult<MutexGuard<'_, Database>> {
        self.db
            .lock()
            .map_err(|_| RepositoryError::Backend("database lock poisoned".into()))
    }
}

#[async_trait]
impl RecordRepository for SqliteStore {
    async fn create(
        &self,
        kind: RecordKind,
        pet_id: &str,
        payload: serde_json::Value,
    ) -> RepoResult<StoredRecord> {
        let record = self.lock()?.insert_record(kind, pet_id, &payload)?;
        tracing::debug!(%pet_id, %kind, record_id = %record.id, "record inserted");
        Ok(record)
    }

    async fn update(
        &self,
        kind: RecordKind,
        id: &str,
        payload: serde_json::Value,
    ) -> RepoResult<StoredRecord> {
        let record = self.lock()?.update_record(kind, id, &payload)?;
        tracing::debug!(%kind, record_id = %id, "record updated");
        Ok(record)
    }

    async fn delete(&self, kind: RecordKind, id: &str) -> RepoResult<()> {
        if self.lock()?.delete_record(kind, id)? {
            Ok(())
        } else {
            Err(RepositoryError::NotFound(format!("Record not found: {} {}", kind, id)))
        }
    }

    async fn query(&self, kind: RecordKind, pet_id: &str) -> RepoResult<Vec<StoredRecord>> {
        Ok(self.lock()?.list_records(kind, pet_id)?)
    }
}

#[async_trait]
impl ActivityLog for SqliteStore {
    async fn append(&self, entry: ActivityEntry) -> RepoResult<()> {
        Ok(self.lock()?.append_activity(&entry)?)
    }
}
