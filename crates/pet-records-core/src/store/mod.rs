//! Persistence boundary.
//!
//! The core never talks to a database directly. It sees a generic record store
//! ([`RecordRepository`]) and a best-effort audit trail ([`ActivityLog`]).
//! Both are async because the production store sits behind a network client.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    ActivityAction, ActivityEntry, DecodeError, Record, RecordForm, RecordKind, StoredRecord,
};

/// Errors returned by a record store. `Display` is the store's own message.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Constraint(String),

    #[error("{0}")]
    Backend(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Generic create/read/update/delete store for every record kind.
///
/// Each call is atomic on its own; there are no multi-record transactions.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Insert a record for `pet_id`. The store assigns id and timestamps.
    async fn create(
        &self,
        kind: RecordKind,
        pet_id: &str,
        payload: serde_json::Value,
    ) -> RepoResult<StoredRecord>;

    /// Replace the full editable field set of an existing record.
    async fn update(
        &self,
        kind: RecordKind,
        id: &str,
        payload: serde_json::Value,
    ) -> RepoResult<StoredRecord>;

    /// Hard-delete a record.
    async fn delete(&self, kind: RecordKind, id: &str) -> RepoResult<()>;

    /// All records of `kind` belonging to `pet_id`.
    async fn query(&self, kind: RecordKind, pet_id: &str) -> RepoResult<Vec<StoredRecord>>;
}

/// Append-only audit trail. Failures never undo the write being logged.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn append(&self, entry: ActivityEntry) -> RepoResult<()>;
}

/// Fetch and decode every record of `T`'s kind for a pet.
pub async fn fetch_records<T: RecordForm>(
    repo: &dyn RecordRepository,
    pet_id: &str,
) -> RepoResult<Vec<Record<T>>> {
    repo.query(T::KIND, pet_id)
        .await?
        .iter()
        .map(|stored| stored.decode::<T>().map_err(RepositoryError::from))
        .collect()
}

/// Append an activity entry, logging instead of failing.
pub(crate) async fn append_best_effort(log: &dyn ActivityLog, entry: ActivityEntry) {
    if let Err(e) = log.append(entry.clone()).await {
        tracing::warn!(
            pet_id = %entry.pet_id,
            record_id = %entry.details.record_id,
            error = %e,
            "activity log append failed: {}",
            entry.summary()
        );
    }
}

/// Explicit delete action. Removes the record, then records who removed it.
///
/// A store failure is returned; an activity-log failure is only logged.
pub async fn delete_record(
    repo: &dyn RecordRepository,
    log: &dyn ActivityLog,
    actor_id: &str,
    pet_id: &str,
    kind: RecordKind,
    record_id: &str,
    record_name: &str,
) -> RepoResult<()> {
    repo.delete(kind, record_id).await?;
    tracing::info!(%pet_id, %kind, %record_id, "record deleted");

    let entry = ActivityEntry::new(
        actor_id,
        pet_id,
        ActivityAction::RecordDeleted,
        kind,
        record_id,
        record_name.to_string(),
    );
    append_best_effort(log, entry).await;
    Ok(())
}
