//! Vaccination records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::{
    require, require_ordered, require_text, FieldErrors, RecordForm, RecordKind,
};
use crate::schedule::{
    classify_due_status_within, compute_next_due, DueStatus, ReferenceVaccine,
};

/// Vaccine grouping used by reference data and filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaccineCategory {
    /// Recommended for every animal of the species
    Core,
    /// Recommended depending on region or exposure
    NonCore,
    /// Lifestyle-driven (boarding, travel)
    Lifestyle,
}

/// Editable field set of a vaccination.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VaccinationForm {
    pub vaccine_name: String,
    pub date_given: Option<NaiveDate>,
    /// Absent means the vaccine does not recur
    pub next_due_date: Option<NaiveDate>,
    pub category: Option<VaccineCategory>,
    /// Recurrence description, e.g. "12 months" or "annual"
    pub booster_interval: Option<String>,
    pub administered_by: Option<String>,
    pub lot_number: Option<String>,
    pub notes: Option<String>,
}

impl VaccinationForm {
    /// Copy name, category and booster interval from a reference vaccine,
    /// then recompute the next due date.
    pub fn apply_reference(&mut self, reference: &ReferenceVaccine) {
        self.vaccine_name = reference.name.clone();
        self.category = Some(reference.category);
        self.booster_interval = reference.booster_interval.clone();
        self.refresh_next_due();
    }

    /// Recompute `next_due_date` from `date_given` and `booster_interval`.
    ///
    /// Leaves an existing due date alone when there is nothing to compute from,
    /// so a manually entered date survives.
    pub fn refresh_next_due(&mut self) {
        if let Some(given) = self.date_given {
            if let Some(next) = compute_next_due(given, self.booster_interval.as_deref()) {
                self.next_due_date = Some(next);
            }
        }
    }

    /// Urgency of the next dose as of `today`.
    pub fn due_status(&self, today: NaiveDate, window_days: i64) -> DueStatus {
        classify_due_status_within(self.next_due_date, today, window_days)
    }
}

impl RecordForm for VaccinationForm {
    const KIND: RecordKind = RecordKind::Vaccination;

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "vaccine_name", &self.vaccine_name);
        require(&mut errors, "date_given", &self.date_given);
        require_ordered(
            &mut errors,
            "next_due_date",
            &self.date_given,
            &self.next_due_date,
        );
        errors
    }

    fn display_name(&self) -> String {
        self.vaccine_name.trim().to_string()
    }

    /// Stored records carry the due date derived from the final
    /// `date_given` and `booster_interval`.
    fn normalized(&self) -> Self {
        let mut form = self.clone();
        form.refresh_next_due();
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::{MSG_END_BEFORE_START, MSG_REQUIRED};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_blank_form_requires_name_and_date() {
        let errors = VaccinationForm::default().validate();
        assert_eq!(errors.get("vaccine_name").map(String::as_str), Some(MSG_REQUIRED));
        assert_eq!(errors.get("date_given").map(String::as_str), Some(MSG_REQUIRED));
    }

    #[test]
    fn test_due_before_given_is_rejected() {
        let form = VaccinationForm {
            vaccine_name: "Rabies".into(),
            date_given: Some(date(2024, 6, 1)),
            next_due_date: Some(date(2024, 5, 1)),
            ..Default::default()
        };

        let errors = form.validate();
        assert_eq!(
            errors.get("next_due_date").map(String::as_str),
            Some(MSG_END_BEFORE_START)
        );
    }

    #[test]
    fn test_apply_reference_computes_next_due() {
        let reference = ReferenceVaccine {
            name: "Rabies (1-year)".into(),
            aliases: vec![],
            species: vec!["canine".into()],
            category: VaccineCategory::Core,
            booster_interval: Some("12 months".into()),
        };

        let mut form = VaccinationForm {
            date_given: Some(date(2024, 6, 1)),
            ..Default::default()
        };
        form.apply_reference(&reference);

        assert_eq!(form.vaccine_name, "Rabies (1-year)");
        assert_eq!(form.category, Some(VaccineCategory::Core));
        assert_eq!(form.next_due_date, Some(date(2025, 6, 1)));
    }

    #[test]
    fn test_refresh_keeps_manual_due_date_without_interval() {
        let mut form = VaccinationForm {
            vaccine_name: "Custom".into(),
            date_given: Some(date(2024, 1, 10)),
            next_due_date: Some(date(2024, 7, 10)),
            ..Default::default()
        };
        form.refresh_next_due();
        assert_eq!(form.next_due_date, Some(date(2024, 7, 10)));
    }

    #[test]
    fn test_normalized_recomputes_stale_due_date() {
        let form = VaccinationForm {
            vaccine_name: "Rabies (1-year)".into(),
            date_given: Some(date(2024, 6, 1)),
            next_due_date: Some(date(2024, 3, 1)),
            booster_interval: Some("12 months".into()),
            ..Default::default()
        };

        let stored = form.normalized();
        assert_eq!(stored.next_due_date, Some(date(2025, 6, 1)));
        assert!(stored.validate().is_empty());
        assert_eq!(form.next_due_date, Some(date(2024, 3, 1)));
    }

    #[test]
    fn test_normalized_keeps_manual_due_date() {
        let form = VaccinationForm {
            vaccine_name: "Custom".into(),
            date_given: Some(date(2024, 1, 10)),
            next_due_date: Some(date(2024, 7, 10)),
            booster_interval: Some("as needed".into()),
            ..Default::default()
        };
        assert_eq!(form.normalized().next_due_date, Some(date(2024, 7, 10)));
    }
}
