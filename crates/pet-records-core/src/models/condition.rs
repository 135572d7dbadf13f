//! Conditions and allergies.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::{
    require, require_ordered, require_text, FieldErrors, RecordForm, RecordKind,
};

/// Condition status. Stored as entered, never derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionStatus {
    #[default]
    Active,
    Resolved,
    Recurring,
}

impl ConditionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionStatus::Active => "active",
            ConditionStatus::Resolved => "resolved",
            ConditionStatus::Recurring => "recurring",
        }
    }
}

/// Editable field set of a diagnosed condition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConditionForm {
    pub name: String,
    pub status: ConditionStatus,
    pub diagnosed_date: Option<NaiveDate>,
    pub resolved_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl ConditionForm {
    /// Resolution is a status transition; conditions are not deleted when cured.
    pub fn resolve(&mut self, on: NaiveDate) {
        self.status = ConditionStatus::Resolved;
        self.resolved_date = Some(on);
    }

    /// A resolved condition came back.
    pub fn mark_recurring(&mut self) {
        self.status = ConditionStatus::Recurring;
        self.resolved_date = None;
    }
}

impl RecordForm for ConditionForm {
    const KIND: RecordKind = RecordKind::Condition;

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "name", &self.name);
        if self.status == ConditionStatus::Resolved {
            require(&mut errors, "resolved_date", &self.resolved_date);
        }
        require_ordered(
            &mut errors,
            "resolved_date",
            &self.diagnosed_date,
            &self.resolved_date,
        );
        errors
    }

    fn display_name(&self) -> String {
        self.name.trim().to_string()
    }
}

/// What an animal is allergic to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllergyType {
    Medication,
    Food,
    Environmental,
    #[default]
    Other,
}

/// Reaction severity of an allergy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
    #[default]
    Mild,
    Moderate,
    Severe,
    LifeThreatening,
}

impl SeverityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLevel::Mild => "mild",
            SeverityLevel::Moderate => "moderate",
            SeverityLevel::Severe => "severe",
            SeverityLevel::LifeThreatening => "life_threatening",
        }
    }
}

/// Editable field set of an allergy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AllergyForm {
    pub allergen: String,
    pub allergy_type: AllergyType,
    pub severity_level: SeverityLevel,
    pub reaction: Option<String>,
}

impl AllergyForm {
    /// Whether this allergy applies to the named medication.
    ///
    /// Only medication allergies count; the allergen must appear inside the name.
    pub fn conflicts_with(&self, medication_name: &str) -> bool {
        let allergen = self.allergen.trim().to_lowercase();
        self.allergy_type == AllergyType::Medication
            && !allergen.is_empty()
            && medication_name.to_lowercase().contains(&allergen)
    }
}

impl RecordForm for AllergyForm {
    const KIND: RecordKind = RecordKind::Allergy;

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "allergen", &self.allergen);
        errors
    }

    fn display_name(&self) -> String {
        self.allergen.trim().to_string()
    }
}
