//! Medication and treatment records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::{
    require_ordered, require_text, FieldErrors, RecordForm, RecordKind, MSG_OUT_OF_RANGE,
};

/// Allowed range of `severity_rating`.
pub const SEVERITY_RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Whether a course of medication or treatment is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Active,
    Ended,
}

impl CourseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Active => "active",
            CourseStatus::Ended => "ended",
        }
    }
}

/// An open `end_date` or one that has not passed keeps a course running.
fn course_running(end_date: Option<NaiveDate>, today: NaiveDate) -> bool {
    end_date.map_or(true, |end| end >= today)
}

/// Editable field set of a medication.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MedicationForm {
    pub medication_name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub start_date: Option<NaiveDate>,
    /// Absent means ongoing
    pub end_date: Option<NaiveDate>,
    pub is_ongoing: bool,
    /// How serious the condition being treated is, 1 (mild) to 5 (critical)
    pub severity_rating: Option<u8>,
    pub notes: Option<String>,
}

impl MedicationForm {
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.is_ongoing || course_running(self.end_date, today)
    }

    pub fn status(&self, today: NaiveDate) -> CourseStatus {
        if self.is_active(today) {
            CourseStatus::Active
        } else {
            CourseStatus::Ended
        }
    }

    /// Case-insensitive name comparison used to recognize the record being edited.
    pub fn same_medication(&self, name: &str) -> bool {
        self.medication_name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

impl RecordForm for MedicationForm {
    const KIND: RecordKind = RecordKind::Medication;

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "medication_name", &self.medication_name);
        require_ordered(&mut errors, "end_date", &self.start_date, &self.end_date);
        if let Some(rating) = self.severity_rating {
            if !SEVERITY_RATING_RANGE.contains(&rating) {
                errors.insert("severity_rating".into(), MSG_OUT_OF_RANGE.into());
            }
        }
        errors
    }

    fn display_name(&self) -> String {
        self.medication_name.trim().to_string()
    }
}

/// Editable field set of a treatment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TreatmentForm {
    pub treatment_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub notes: Option<String>,
}

impl TreatmentForm {
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.is_active || course_running(self.end_date, today)
    }

    pub fn status(&self, today: NaiveDate) -> CourseStatus {
        if self.is_current(today) {
            CourseStatus::Active
        } else {
            CourseStatus::Ended
        }
    }
}

impl RecordForm for TreatmentForm {
    const KIND: RecordKind = RecordKind::Treatment;

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "treatment_name", &self.treatment_name);
        require_ordered(&mut errors, "end_date", &self.start_date, &self.end_date);
        errors
    }

    fn display_name(&self) -> String {
        self.treatment_name.trim().to_string()
    }
}
