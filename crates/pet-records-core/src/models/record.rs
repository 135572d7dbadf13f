//! Shared record metadata and the contract every record kind implements.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation message keys. Resolved to display text by a [`crate::Translator`].
pub const MSG_REQUIRED: &str = "validation.required";
pub const MSG_END_BEFORE_START: &str = "validation.endBeforeStart";
pub const MSG_OUT_OF_RANGE: &str = "validation.outOfRange";

/// Per-field validation messages, keyed by field name.
pub type FieldErrors = BTreeMap<String, String>;

/// Every kind of health record the core knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Vaccination,
    Medication,
    Treatment,
    Condition,
    Allergy,
    Weight,
    Document,
    Visit,
}

impl RecordKind {
    pub const ALL: [RecordKind; 8] = [
        RecordKind::Vaccination,
        RecordKind::Medication,
        RecordKind::Treatment,
        RecordKind::Condition,
        RecordKind::Allergy,
        RecordKind::Weight,
        RecordKind::Document,
        RecordKind::Visit,
    ];

    /// Stable storage tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Vaccination => "vaccination",
            RecordKind::Medication => "medication",
            RecordKind::Treatment => "treatment",
            RecordKind::Condition => "condition",
            RecordKind::Allergy => "allergy",
            RecordKind::Weight => "weight",
            RecordKind::Document => "document",
            RecordKind::Visit => "visit",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DecodeError::UnknownKind(s.to_string()))
    }
}

/// The editable field set of one record kind.
///
/// Implementors are the `data` carried by a form and the payload persisted
/// by the record store. Updates always replace the whole field set.
pub trait RecordForm:
    Clone + Default + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: RecordKind;

    /// Default validator used when the caller does not supply one.
    fn validate(&self) -> FieldErrors;

    /// Short human-facing name used in activity entries.
    fn display_name(&self) -> String;

    /// Canonical form written to storage.
    fn normalized(&self) -> Self {
        self.clone()
    }
}

/// A persisted record of a known kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record<T> {
    /// Store-assigned opaque ID
    pub id: String,
    /// Owning pet, immutable after creation
    pub pet_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Editable field set
    pub data: T,
}

/// A persisted record as the generic store sees it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredRecord {
    pub id: String,
    pub pet_id: String,
    pub kind: RecordKind,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Errors decoding a stored record into a typed one.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Expected a {expected} record, found {found}")]
    KindMismatch {
        expected: RecordKind,
        found: RecordKind,
    },

    #[error("Unknown record kind: {0}")]
    UnknownKind(String),

    #[error("Malformed record payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl StoredRecord {
    /// Decode the payload into the field set of `T`.
    pub fn decode<T: RecordForm>(&self) -> Result<Record<T>, DecodeError> {
        if self.kind != T::KIND {
            return Err(DecodeError::KindMismatch {
                expected: T::KIND,
                found: self.kind,
            });
        }

        Ok(Record {
            id: self.id.clone(),
            pet_id: self.pet_id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            data: serde_json::from_value(self.payload.clone())?,
        })
    }
}

/// Record `MSG_REQUIRED` for `field` when `value` is blank.
pub(crate) fn require_text(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field.to_string(), MSG_REQUIRED.to_string());
    }
}

/// Record `MSG_REQUIRED` for `field` when `value` is absent.
pub(crate) fn require<T>(errors: &mut FieldErrors, field: &str, value: &Option<T>) {
    if value.is_none() {
        errors.insert(field.to_string(), MSG_REQUIRED.to_string());
    }
}

/// Record `MSG_END_BEFORE_START` on `field` when `end` precedes `start`.
pub(crate) fn require_ordered<T: PartialOrd>(
    errors: &mut FieldErrors,
    field: &str,
    start: &Option<T>,
    end: &Option<T>,
) {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            errors.insert(field.to_string(), MSG_END_BEFORE_START.to_string());
        }
    }
}

/// Trimmed, non-empty text or `None`.
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VaccinationForm;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in RecordKind::ALL {
            assert_eq!(kind.as_str().parse::<RecordKind>().unwrap(), kind);
        }
        assert!("hamster".parse::<RecordKind>().is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_kind() {
        let now = Utc::now();
        let stored = StoredRecord {
            id: "r1".into(),
            pet_id: "pet-1".into(),
            kind: RecordKind::Medication,
            payload: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        };

        let result = stored.decode::<VaccinationForm>();
        assert!(matches!(result, Err(DecodeError::KindMismatch { .. })));
    }

    #[test]
    fn test_decode_fills_missing_fields_with_defaults() {
        let now = Utc::now();
        let stored = StoredRecord {
            id: "r1".into(),
            pet_id: "pet-1".into(),
            kind: RecordKind::Vaccination,
            payload: serde_json::json!({ "vaccine_name": "Rabies" }),
            created_at: now,
            updated_at: now,
        };

        let record = stored.decode::<VaccinationForm>().unwrap();
        assert_eq!(record.data.vaccine_name, "Rabies");
        assert_eq!(record.data.date_given, None);
        assert_eq!(record.pet_id, "pet-1");
    }
}
