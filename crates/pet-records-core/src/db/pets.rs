//! Pet database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Pet;

const PET_COLUMNS: &str =
    "id, name, species, breed, date_of_birth, owner_id, created_at, updated_at";

fn pet_from_row(row: &Row<'_>) -> rusqlite::Result<Pet> {
    Ok(Pet {
        id: row.get(0)?,
        name: row.get(1)?,
        species: row.get(2)?,
        breed: row.get(3)?,
        date_of_birth: row.get(4)?,
        owner_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Database {
    /// Insert a new pet.
    pub fn insert_pet(&self, pet: &Pet) -> DbResult<()> {
        self.conn.execute(
            &format!("INSERT INTO pets ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)", PET_COLUMNS),
            params![
                pet.id,
                pet.name,
                pet.species,
                pet.breed,
                pet.date_of_birth,
                pet.owner_id,
                pet.created_at,
                pet.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing pet's profile fields.
    pub fn update_pet(&self, pet: &Pet) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE pets SET
                name = ?2,
                species = ?3,
                breed = ?4,
                date_of_birth = ?5,
                owner_id = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
            params![
                pet.id,
                pet.name,
                pet.species,
                pet.breed,
                pet.date_of_birth,
                pet.owner_id,
                chrono::Utc::now(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a pet by ID.
    pub fn get_pet(&self, id: &str) -> DbResult<Option<Pet>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM pets WHERE id = ?", PET_COLUMNS),
                [id],
                pet_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all pets by name.
    pub fn list_pets(&self) -> DbResult<Vec<Pet>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM pets ORDER BY name", PET_COLUMNS))?;
        let rows = stmt.query_map([], pet_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a pet and, by cascade, its records.
    pub fn delete_pet(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM pets WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
