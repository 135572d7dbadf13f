//! Medication interaction advisor.
//!
//! Before a medication is saved, the advisor looks at the pet's other active
//! medications and its medication allergies and raises advisory warnings:
//! - allergy conflict: a medication allergen appears in the medication name
//! - polypharmacy: the pet already takes `threshold` or more other medications
//!
//! Warnings are advisory. A fetch failure yields no warnings rather than
//! blocking record entry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{CoreConfig, DEFAULT_POLYPHARMACY_THRESHOLD};
use crate::form::Interceptor;
use crate::i18n::{interpolate, Translator};
use crate::models::{AllergyForm, MedicationForm, Record, SeverityLevel};
use crate::store::{fetch_records, RecordRepository, RepoResult};

/// How prominently a warning should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    Info,
    Caution,
    Critical,
}

impl From<SeverityLevel> for WarningSeverity {
    fn from(level: SeverityLevel) -> Self {
        match level {
            SeverityLevel::Mild | SeverityLevel::Moderate => WarningSeverity::Caution,
            SeverityLevel::Severe | SeverityLevel::LifeThreatening => WarningSeverity::Critical,
        }
    }
}

/// What a warning is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WarningKind {
    AllergyConflict {
        allergen: String,
        severity: SeverityLevel,
    },
    Polypharmacy {
        active_count: usize,
    },
}

/// A caution that needs acknowledgment before the write goes ahead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryWarning {
    pub kind: WarningKind,
    pub severity: WarningSeverity,
    /// Translated, display-ready text
    pub message: String,
}

/// Raises allergy and polypharmacy warnings for a medication about to be saved.
pub struct InteractionAdvisor {
    repo: Arc<dyn RecordRepository>,
    translator: Arc<dyn Translator>,
    polypharmacy_threshold: usize,
}

impl InteractionAdvisor {
    /// Create an advisor with the default polypharmacy threshold.
    pub fn new(repo: Arc<dyn RecordRepository>, translator: Arc<dyn Translator>) -> Self {
        Self {
            repo,
            translator,
            polypharmacy_threshold: DEFAULT_POLYPHARMACY_THRESHOLD,
        }
    }

    /// Take thresholds from `config`.
    pub fn with_config(mut self, config: &CoreConfig) -> Self {
        self.polypharmacy_threshold = config.polypharmacy_threshold;
        self
    }

    pub fn polypharmacy_threshold(&self) -> usize {
        self.polypharmacy_threshold
    }

    /// Check `medication_name` for `pet_id` as of today (UTC).
    pub async fn check_interactions(
        &self,
        medication_name: &str,
        pet_id: &str,
    ) -> Vec<AdvisoryWarning> {
        self.check_interactions_on(medication_name, pet_id, Utc::now().date_naive())
            .await
    }

    /// Check `medication_name` for `pet_id` as of `today`.
    pub async fn check_interactions_on(
        &self,
        medication_name: &str,
        pet_id: &str,
        today: NaiveDate,
    ) -> Vec<AdvisoryWarning> {
        let (medications, allergies) = match self.gather(pet_id).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(%pet_id, error = %e, "interaction check skipped: fetch failed");
                return Vec::new();
            }
        };

        let mut warnings: Vec<AdvisoryWarning> = allergies
            .iter()
            .filter(|allergy| allergy.data.conflicts_with(medication_name))
            .map(|allergy| self.allergy_warning(&allergy.data, medication_name))
            .collect();

        let other_active = medications
            .iter()
            .filter(|med| med.data.is_active(today) && !med.data.same_medication(medication_name))
            .count();
        if other_active >= self.polypharmacy_threshold {
            warnings.push(self.polypharmacy_warning(other_active));
        }

        tracing::debug!(%pet_id, medication = %medication_name, warnings = warnings.len(), "interaction check done");
        warnings
    }

    async fn gather(
        &self,
        pet_id: &str,
    ) -> RepoResult<(Vec<Record<MedicationForm>>, Vec<Record<AllergyForm>>)> {
        let medications = fetch_records::<MedicationForm>(self.repo.as_ref(), pet_id).await?;
        let allergies = fetch_records::<AllergyForm>(self.repo.as_ref(), pet_id).await?;
        Ok((medications, allergies))
    }

    fn allergy_warning(&self, allergy: &AllergyForm, medication_name: &str) -> AdvisoryWarning {
        let allergen = allergy.allergen.trim().to_string();
        let severity_text = self
            .translator
            .t(&format!("severity.{}", allergy.severity_level.as_str()));
        let message = interpolate(
            &self.translator.t("advisor.allergyConflict"),
            &[
                ("allergen", allergen.as_str()),
                ("severity", severity_text.as_str()),
                ("medication", medication_name.trim()),
            ],
        );

        AdvisoryWarning {
            severity: allergy.severity_level.into(),
            kind: WarningKind::AllergyConflict {
                allergen,
                severity: allergy.severity_level,
            },
            message,
        }
    }

    fn polypharmacy_warning(&self, active_count: usize) -> AdvisoryWarning {
        let count = active_count.to_string();
        let message = interpolate(
            &self.translator.t("advisor.polypharmacy"),
            &[("count", count.as_str())],
        );

        AdvisoryWarning {
            kind: WarningKind::Polypharmacy { active_count },
            severity: WarningSeverity::Info,
            message,
        }
    }
}

#[async_trait]
impl Interceptor<MedicationForm> for InteractionAdvisor {
    async fn intercept(&self, pet_id: &str, data: &MedicationForm) -> Vec<AdvisoryWarning> {
        self.check_interactions(&data.medication_name, pet_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        assert_eq!(WarningSeverity::from(SeverityLevel::Mild), WarningSeverity::Caution);
        assert_eq!(WarningSeverity::from(SeverityLevel::Severe), WarningSeverity::Critical);
        assert!(WarningSeverity::Critical > WarningSeverity::Info);
    }

    #[test]
    fn test_warning_kind_serializes_tagged() {
        let kind = WarningKind::Polypharmacy { active_count: 4 };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "polypharmacy");
        assert_eq!(json["active_count"], 4);
    }
}
