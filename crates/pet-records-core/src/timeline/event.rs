//! Timeline event types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    AllergyForm, ConditionForm, ConditionStatus, CourseStatus, DocumentForm, MedicationForm, Pet,
    Record, RecordKind, TreatmentForm, VaccinationForm, VisitForm, WeightForm,
};
use crate::schedule::DueStatus;

/// Kind tag of a timeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    Vaccination,
    Medication,
    Treatment,
    Condition,
    Allergy,
    Weight,
    Document,
    Visit,
    ProfileCreated,
}

impl TimelineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineKind::ProfileCreated => "profile_created",
            TimelineKind::Vaccination => RecordKind::Vaccination.as_str(),
            TimelineKind::Medication => RecordKind::Medication.as_str(),
            TimelineKind::Treatment => RecordKind::Treatment.as_str(),
            TimelineKind::Condition => RecordKind::Condition.as_str(),
            TimelineKind::Allergy => RecordKind::Allergy.as_str(),
            TimelineKind::Weight => RecordKind::Weight.as_str(),
            TimelineKind::Document => RecordKind::Document.as_str(),
            TimelineKind::Visit => RecordKind::Visit.as_str(),
        }
    }

    /// Prefix that keeps event ids unique across kinds.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            TimelineKind::Vaccination => "vacc-",
            TimelineKind::Medication => "med-",
            TimelineKind::Treatment => "treat-",
            TimelineKind::Condition => "cond-",
            TimelineKind::Allergy => "allergy-",
            TimelineKind::Weight => "weight-",
            TimelineKind::Document => "doc-",
            TimelineKind::Visit => "visit-",
            TimelineKind::ProfileCreated => "profile-",
        }
    }
}

impl From<RecordKind> for TimelineKind {
    fn from(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Vaccination => TimelineKind::Vaccination,
            RecordKind::Medication => TimelineKind::Medication,
            RecordKind::Treatment => TimelineKind::Treatment,
            RecordKind::Condition => TimelineKind::Condition,
            RecordKind::Allergy => TimelineKind::Allergy,
            RecordKind::Weight => TimelineKind::Weight,
            RecordKind::Document => TimelineKind::Document,
            RecordKind::Visit => TimelineKind::Visit,
        }
    }
}

impl fmt::Display for TimelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived or recorded status shown next to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StatusTag {
    /// Vaccination urgency
    Due(DueStatus),
    /// Medication or treatment course
    Course(CourseStatus),
    /// Condition status as recorded
    Condition(ConditionStatus),
}

impl StatusTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusTag::Due(status) => status.as_str(),
            StatusTag::Course(status) => status.as_str(),
            StatusTag::Condition(status) => status.as_str(),
        }
    }
}

/// One entry of the merged history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Kind prefix + record id, unique across kinds
    pub id: String,
    pub kind: TimelineKind,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub status: Option<StatusTag>,
}

/// Which events to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimelineFilter {
    #[default]
    All,
    Kind(TimelineKind),
}

impl TimelineFilter {
    pub fn matches(&self, event: &TimelineEvent) -> bool {
        match self {
            TimelineFilter::All => true,
            TimelineFilter::Kind(kind) => event.kind == *kind,
        }
    }
}

impl FromStr for TimelineFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const KINDS: [TimelineKind; 9] = [
            TimelineKind::Vaccination,
            TimelineKind::Medication,
            TimelineKind::Treatment,
            TimelineKind::Condition,
            TimelineKind::Allergy,
            TimelineKind::Weight,
            TimelineKind::Document,
            TimelineKind::Visit,
            TimelineKind::ProfileCreated,
        ];

        if s == "all" {
            return Ok(TimelineFilter::All);
        }
        KINDS
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .map(TimelineFilter::Kind)
            .ok_or_else(|| format!("Unknown timeline filter: {}", s))
    }
}

/// Synthetic "profile created" entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMarker {
    pub pet_id: String,
    pub pet_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Pet> for ProfileMarker {
    fn from(pet: &Pet) -> Self {
        Self {
            pet_id: pet.id.clone(),
            pet_name: pet.name.clone(),
            created_at: pet.created_at,
        }
    }
}

/// One already-fetched collection handed to the aggregator.
#[derive(Debug, Clone)]
pub enum SourceBatch {
    Vaccinations(Vec<Record<VaccinationForm>>),
    Medications(Vec<Record<MedicationForm>>),
    Treatments(Vec<Record<TreatmentForm>>),
    Conditions(Vec<Record<ConditionForm>>),
    Allergies(Vec<Record<AllergyForm>>),
    Weights(Vec<Record<WeightForm>>),
    Documents(Vec<Record<DocumentForm>>),
    Visits(Vec<Record<VisitForm>>),
    Profile(ProfileMarker),
}

/// Record collections in the order they were supplied.
///
/// Order matters only for tie-breaking events that share a date.
#[derive(Debug, Clone, Default)]
pub struct TimelineSources {
    pub(crate) batches: Vec<SourceBatch>,
}

impl TimelineSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, batch: SourceBatch) {
        self.batches.push(batch);
    }

    pub fn with(mut self, batch: SourceBatch) -> Self {
        self.push(batch);
        self
    }

    pub fn with_profile(self, marker: ProfileMarker) -> Self {
        self.with(SourceBatch::Profile(marker))
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}
