//! Pet models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A pet profile. Every health record belongs to exactly one pet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pet {
    /// Local UUID - always present, generated locally
    pub id: String,
    /// Pet name
    pub name: String,
    /// Species (e.g., "canine", "feline")
    pub species: String,
    /// Breed
    pub breed: Option<String>,
    /// Date of birth
    pub date_of_birth: Option<NaiveDate>,
    /// Primary owner account
    pub owner_id: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Pet {
    /// Create a new pet with required fields.
    pub fn new(name: String, species: String) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            species,
            breed: None,
            date_of_birth: None,
            owner_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Get the canonical species name (lowercase).
    pub fn canonical_species(&self) -> String {
        self.species.trim().to_lowercase()
    }

    /// Age in whole years as of `today`.
    pub fn age_years(&self, today: NaiveDate) -> Option<u32> {
        self.date_of_birth
            .and_then(|dob| today.years_since(dob))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pet() {
        let pet = Pet::new("Max".into(), "canine".into());
        assert_eq!(pet.name, "Max");
        assert_eq!(pet.species, "canine");
        assert_eq!(pet.id.len(), 36); // UUID format
        assert_eq!(pet.created_at, pet.updated_at);
    }

    #[test]
    fn test_canonical_species() {
        let pet = Pet::new("Max".into(), " Canine".into());
        assert_eq!(pet.canonical_species(), "canine");
    }

    #[test]
    fn test_age_years() {
        let mut pet = Pet::new("Luna".into(), "feline".into());
        assert_eq!(pet.age_years(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), None);

        pet.date_of_birth = NaiveDate::from_ymd_opt(2020, 6, 15);
        let today = NaiveDate::from_ymd_opt(2024, 6, 14).unwrap();
        assert_eq!(pet.age_years(today), Some(3));
    }
}
