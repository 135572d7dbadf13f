//! Activity log persistence.

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Row};

use super::{Database, DbResult};
use crate::models::{ActivityAction, ActivityDetails, ActivityEntry, RecordKind};

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<ActivityEntry> {
    let action: String = row.get(2)?;
    let action = ActivityAction::parse(&action).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("unknown activity action: {}", action).into(),
        )
    })?;
    let kind: String = row.get(3)?;
    let kind = kind
        .parse::<RecordKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    Ok(ActivityEntry {
        actor_id: row.get(0)?,
        pet_id: row.get(1)?,
        action,
        details: ActivityDetails {
            kind,
            record_id: row.get(4)?,
            record_name: row.get(5)?,
        },
    })
}

impl Database {
    /// Append one activity entry.
    pub fn append_activity(&self, entry: &ActivityEntry) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO activity_log (
                actor_id, pet_id, action, kind, record_id, record_name, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                entry.actor_id,
                entry.pet_id,
                entry.action.as_str(),
                entry.details.kind.as_str(),
                entry.details.record_id,
                entry.details.record_name,
                Utc::now(),
            ],
        )?;
        Ok(())
    }

    /// Activity for a pet, in the order it was written.
    pub fn list_activity(&self, pet_id: &str) -> DbResult<Vec<ActivityEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT actor_id, pet_id, action, kind, record_id, record_name
            FROM activity_log
            WHERE pet_id = ?
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([pet_id], entry_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
