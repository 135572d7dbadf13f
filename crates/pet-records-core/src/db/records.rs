//! Health record database operations.

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::{RecordKind, StoredRecord};

const RECORD_COLUMNS: &str = "id, pet_id, kind, payload, created_at, updated_at";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    let kind: String = row.get(2)?;
    let kind = kind
        .parse::<RecordKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;
    let payload: String = row.get(3)?;
    let payload = serde_json::from_str(&payload)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(StoredRecord {
        id: row.get(0)?,
        pet_id: row.get(1)?,
        kind,
        payload,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl Database {
    /// Insert a record for `pet_id`, assigning its id and timestamps.
    pub fn insert_record(
        &self,
        kind: RecordKind,
        pet_id: &str,
        payload: &serde_json::Value,
    ) -> DbResult<StoredRecord> {
        let now = Utc::now();
        let record = StoredRecord {
            id: uuid::Uuid::new_v4().to_string(),
            pet_id: pet_id.to_string(),
            kind,
            payload: payload.clone(),
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            &format!(
                "INSERT INTO health_records ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                RECORD_COLUMNS
            ),
            params![
                record.id,
                record.pet_id,
                kind.as_str(),
                serde_json::to_string(payload)?,
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(record)
    }

    /// Replace a record's payload. `pet_id` and `created_at` never change.
    pub fn update_record(
        &self,
        kind: RecordKind,
        id: &str,
        payload: &serde_json::Value,
    ) -> DbResult<StoredRecord> {
        let rows_affected = self.conn.execute(
            "UPDATE health_records SET payload = ?3, updated_at = ?4 WHERE id = ?1 AND kind = ?2",
            params![id, kind.as_str(), serde_json::to_string(payload)?, Utc::now()],
        )?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("{} {}", kind, id)));
        }

        self.get_record(id)?
            .ok_or_else(|| DbError::NotFound(format!("{} {}", kind, id)))
    }

    /// Get a record by ID.
    pub fn get_record(&self, id: &str) -> DbResult<Option<StoredRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM health_records WHERE id = ?", RECORD_COLUMNS),
                [id],
                record_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Records of one kind for a pet, oldest first.
    pub fn list_records(&self, kind: RecordKind, pet_id: &str) -> DbResult<Vec<StoredRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM health_records WHERE pet_id = ?1 AND kind = ?2 ORDER BY created_at, rowid",
            RECORD_COLUMNS
        ))?;
        let rows = stmt.query_map(params![pet_id, kind.as_str()], record_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Hard-delete a record of `kind`.
    pub fn delete_record(&self, kind: RecordKind, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM health_records WHERE id = ?1 AND kind = ?2",
            params![id, kind.as_str()],
        )?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Pet;
    use serde_json::json;

    fn db_with_pet() -> (Database, Pet) {
        let db = Database::open_in_memory().unwrap();
        let pet = Pet::new("Rex".into(), "canine".into());
        db.insert_pet(&pet).unwrap();
        (db, pet)
    }

    #[test]
    fn test_insert_and_list() {
        let (db, pet) = db_with_pet();
        let payload = json!({"weight": 12.5, "unit": "kilograms", "date": "2024-05-01"});

        let created = db.insert_record(RecordKind::Weight, &pet.id, &payload).unwrap();
        assert_eq!(created.pet_id, pet.id);
        assert_eq!(created.created_at, created.updated_at);

        let listed = db.list_records(RecordKind::Weight, &pet.id).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].payload, payload);
        assert!(db.list_records(RecordKind::Vaccination, &pet.id).unwrap().is_empty());
    }

    #[test]
    fn test_update_keeps_owner_and_refreshes_timestamp() {
        let (db, pet) = db_with_pet();
        let created = db
            .insert_record(RecordKind::Allergy, &pet.id, &json!({"allergen": "Chicken"}))
            .unwrap();

        let updated = db
            .update_record(RecordKind::Allergy, &created.id, &json!({"allergen": "Beef"}))
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.pet_id, pet.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.payload["allergen"], "Beef");
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let (db, _) = db_with_pet();
        let result = db.update_record(RecordKind::Allergy, "nope", &json!({}));
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_update_wrong_kind_is_not_found() {
        let (db, pet) = db_with_pet();
        let created = db.insert_record(RecordKind::Allergy, &pet.id, &json!({})).unwrap();
        let result = db.update_record(RecordKind::Weight, &created.id, &json!({}));
        assert!(matches!(result, Err(DbError::NotFound(_))));
    }

    #[test]
    fn test_unknown_pet_violates_constraint() {
        let (db, _) = db_with_pet();
        let err = db
            .insert_record(RecordKind::Visit, "no-such-pet", &json!({}))
            .unwrap_err();
        assert!(err.is_constraint());
    }

    #[test]
    fn test_delete_and_cascade() {
        let (db, pet) = db_with_pet();
        let a = db.insert_record(RecordKind::Visit, &pet.id, &json!({})).unwrap();
        db.insert_record(RecordKind::Visit, &pet.id, &json!({})).unwrap();

        assert!(db.delete_record(RecordKind::Visit, &a.id).unwrap());
        assert!(!db.delete_record(RecordKind::Visit, &a.id).unwrap());
        assert_eq!(db.list_records(RecordKind::Visit, &pet.id).unwrap().len(), 1);

        db.delete_pet(&pet.id).unwrap();
        assert!(db.list_records(RecordKind::Visit, &pet.id).unwrap().is_empty());
    }
}
