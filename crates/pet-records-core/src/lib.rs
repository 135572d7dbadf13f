//! Pet Records Core Library
//!
//! Local-first pet health records: record entry, medication interaction
//! advice, due-date tracking and a merged health timeline.
//!
//! # Architecture
//!
//! ```text
//!   Host UI (forms, lists, timeline)
//!          │
//!          ▼
//!   FormEngine ──validate──► Interceptor (InteractionAdvisor)
//!          │                         │
//!          │◄──── warnings / ok ─────┘
//!          ▼
//!   RecordRepository ──► ActivityLog (best effort)
//!          │
//!          ▼
//!   TimelineAggregator ◄── DueDateCalculator
//! ```
//!
//! # Core Principle
//!
//! **Warnings advise, they never block.** A failed interaction check or
//! activity-log write is logged and the record entry carries on.
//!
//! # Modules
//!
//! - [`models`]: Record kinds and their field sets
//! - [`schedule`]: Due-date recurrence math and reference vaccines
//! - [`advisor`]: Allergy and polypharmacy warnings
//! - [`form`]: Generic record-entry state machine
//! - [`timeline`]: Chronological history across record kinds
//! - [`store`]: Repository and activity-log traits
//! - [`db`]: SQLite implementation of the store
//! - [`config`]: Tunable thresholds
//! - [`i18n`]: Translation lookup

pub mod advisor;
pub mod config;
pub mod db;
pub mod form;
pub mod i18n;
pub mod models;
pub mod schedule;
pub mod store;
pub mod timeline;

// Re-export commonly used types
pub use advisor::{AdvisoryWarning, InteractionAdvisor, WarningKind, WarningSeverity};
pub use config::CoreConfig;
pub use db::{Database, SqliteStore};
pub use form::{FormContext, FormEngine, FormPhase, FormState, Interceptor, SubmitOutcome};
pub use i18n::{EnglishTranslator, Translator};
pub use models::{
    AllergyForm, ConditionForm, DocumentForm, FieldErrors, MedicationForm, Pet, Record,
    RecordForm, RecordKind, StoredRecord, TreatmentForm, VaccinationForm, VisitForm, WeightForm,
};
pub use schedule::{
    classify_due_status, compute_next_due, DueStatus, ReferenceCatalog, ReferenceVaccine,
};
pub use store::{delete_record, fetch_records, ActivityLog, RecordRepository, RepositoryError};
pub use timeline::{
    build_timeline, filter_timeline, TimelineAggregator, TimelineEvent, TimelineFilter,
    TimelineKind, TimelineSources,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use futures::executor::block_on;

use timeline::{ProfileMarker, SourceBatch};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PetRecordsError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for PetRecordsError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => PetRecordsError::NotFound(what),
            other => PetRecordsError::DatabaseError(other.to_string()),
        }
    }
}

impl From<RepositoryError> for PetRecordsError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(msg) => PetRecordsError::NotFound(msg),
            RepositoryError::Constraint(msg) => PetRecordsError::InvalidInput(msg),
            RepositoryError::Backend(msg) => PetRecordsError::DatabaseError(msg),
            RepositoryError::Decode(e) => PetRecordsError::SerializationError(e.to_string()),
        }
    }
}

impl From<models::DecodeError> for PetRecordsError {
    fn from(e: models::DecodeError) -> Self {
        PetRecordsError::SerializationError(e.to_string())
    }
}

impl From<serde_json::Error> for PetRecordsError {
    fn from(e: serde_json::Error) -> Self {
        PetRecordsError::SerializationError(e.to_string())
    }
}

impl From<config::ConfigError> for PetRecordsError {
    fn from(e: config::ConfigError) -> Self {
        PetRecordsError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PetRecordsError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PetRecordsError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<PetRecordsCore>, PetRecordsError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(PetRecordsCore::new(db, CoreConfig::default())))
}

/// Open or create a database, with settings from a JSON document.
#[uniffi::export]
pub fn open_database_with_config(
    path: String,
    config_json: String,
) -> Result<Arc<PetRecordsCore>, PetRecordsError> {
    let config = CoreConfig::from_json(&config_json)?;
    let db = Database::open(&path)?;
    Ok(Arc::new(PetRecordsCore::new(db, config)))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<PetRecordsCore>, PetRecordsError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(PetRecordsCore::new(db, CoreConfig::default())))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe entry point for hosts.
#[derive(uniffi::Object)]
pub struct PetRecordsCore {
    store: SqliteStore,
    config: CoreConfig,
    catalog: ReferenceCatalog,
    translator: Arc<dyn Translator>,
}

impl PetRecordsCore {
    fn new(db: Database, config: CoreConfig) -> Self {
        Self {
            store: SqliteStore::new(db),
            config,
            catalog: ReferenceCatalog::with_defaults(),
            translator: Arc::new(EnglishTranslator::new()),
        }
    }

    fn db(&self) -> Arc<Mutex<Database>> {
        self.store.database()
    }

    fn advisor(&self) -> InteractionAdvisor {
        InteractionAdvisor::new(Arc::new(self.store.clone()), Arc::clone(&self.translator))
            .with_config(&self.config)
    }

    fn form_context(&self, actor_id: String) -> FormContext {
        FormContext::new(
            Arc::new(self.store.clone()),
            Arc::new(self.store.clone()),
            actor_id,
        )
    }

    fn submit_as<F: RecordForm>(
        &self,
        actor_id: String,
        pet_id: String,
        payload_json: &str,
        existing_id: Option<String>,
        interceptor: Option<Arc<dyn Interceptor<F>>>,
    ) -> Result<FfiSubmitResult, PetRecordsError> {
        let data: F = serde_json::from_str(payload_json)?;
        let context = self.form_context(actor_id);

        let engine = match existing_id {
            Some(id) => {
                let stored = self
                    .db()
                    .lock()?
                    .get_record(&id)?
                    .ok_or_else(|| PetRecordsError::NotFound(id.clone()))?;
                if stored.pet_id != pet_id {
                    return Err(PetRecordsError::InvalidInput(format!(
                        "Record {} does not belong to pet {}",
                        id, pet_id
                    )));
                }
                let mut record = stored.decode::<F>()?;
                record.data = data;
                FormEngine::for_existing(context, &record)
            }
            None => FormEngine::new(context, pet_id, data),
        };
        let engine = match interceptor {
            Some(interceptor) => engine.with_interceptor(interceptor),
            None => engine,
        };

        let outcome = block_on(engine.submit());
        Ok(FfiSubmitResult::from_outcome(outcome, self.translator.as_ref()))
    }

    /// Fill in the configured unit when a weight payload names none.
    fn with_preferred_unit(&self, payload_json: &str) -> Result<String, PetRecordsError> {
        let mut value: serde_json::Value = serde_json::from_str(payload_json)?;
        if let Some(fields) = value.as_object_mut() {
            if !fields.contains_key("unit") {
                let unit = serde_json::to_value(self.config.preferred_weight_unit)?;
                fields.insert("unit".to_string(), unit);
            }
        }
        Ok(value.to_string())
    }

    fn collect_sources(&self, pet: &Pet) -> Result<TimelineSources, PetRecordsError> {
        let repo: &dyn RecordRepository = &self.store;
        let id = pet.id.as_str();

        let sources = block_on(async {
            Ok::<_, RepositoryError>(TimelineSources::new()
                .with(SourceBatch::Vaccinations(fetch_records(repo, id).await?))
                .with(SourceBatch::Medications(fetch_records(repo, id).await?))
                .with(SourceBatch::Treatments(fetch_records(repo, id).await?))
                .with(SourceBatch::Conditions(fetch_records(repo, id).await?))
                .with(SourceBatch::Allergies(fetch_records(repo, id).await?))
                .with(SourceBatch::Weights(fetch_records(repo, id).await?))
                .with(SourceBatch::Documents(fetch_records(repo, id).await?))
                .with(SourceBatch::Visits(fetch_records(repo, id).await?))
                .with_profile(ProfileMarker::from(pet)))
        })?;
        Ok(sources)
    }

    fn require_pet(&self, pet_id: &str) -> Result<Pet, PetRecordsError> {
        self.db()
            .lock()?
            .get_pet(pet_id)?
            .ok_or_else(|| PetRecordsError::NotFound(format!("Pet {}", pet_id)))
    }
}

#[uniffi::export]
impl PetRecordsCore {
    // =========================================================================
    // Pet Operations
    // =========================================================================

    /// Create a new pet.
    pub fn create_pet(&self, name: String, species: String) -> Result<FfiPet, PetRecordsError> {
        if name.trim().is_empty() {
            return Err(PetRecordsError::InvalidInput("Pet name is required".into()));
        }
        let pet = Pet::new(name, species);
        self.db().lock()?.insert_pet(&pet)?;
        tracing::info!(pet_id = %pet.id, "pet created");
        Ok(pet.into())
    }

    /// Get a pet by ID.
    pub fn get_pet(&self, pet_id: String) -> Result<Option<FfiPet>, PetRecordsError> {
        let pet = self.db().lock()?.get_pet(&pet_id)?;
        Ok(pet.map(|p| p.into()))
    }

    /// List all pets by name.
    pub fn list_pets(&self) -> Result<Vec<FfiPet>, PetRecordsError> {
        let pets = self.db().lock()?.list_pets()?;
        Ok(pets.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Record Operations
    // =========================================================================

    /// All records of `kind` for a pet, as a JSON array.
    pub fn list_records_json(
        &self,
        pet_id: String,
        kind: String,
    ) -> Result<String, PetRecordsError> {
        let kind = parse_kind(&kind)?;
        self.require_pet(&pet_id)?;
        let records = self.db().lock()?.list_records(kind, &pet_id)?;
        Ok(serde_json::to_string(&records)?)
    }

    /// Validate and save a record from its JSON field set.
    ///
    /// Medications are checked for interactions first unless
    /// `acknowledge_warnings` is set; warnings come back unsaved.
    pub fn submit_record(
        &self,
        actor_id: String,
        pet_id: String,
        kind: String,
        payload_json: String,
        existing_id: Option<String>,
        acknowledge_warnings: bool,
    ) -> Result<FfiSubmitResult, PetRecordsError> {
        let json = payload_json.as_str();
        match parse_kind(&kind)? {
            RecordKind::Vaccination => {
                self.submit_as::<VaccinationForm>(actor_id, pet_id, json, existing_id, None)
            }
            RecordKind::Medication => {
                let interceptor: Option<Arc<dyn Interceptor<MedicationForm>>> =
                    if acknowledge_warnings {
                        None
                    } else {
                        Some(Arc::new(self.advisor()))
                    };
                self.submit_as::<MedicationForm>(actor_id, pet_id, json, existing_id, interceptor)
            }
            RecordKind::Treatment => {
                self.submit_as::<TreatmentForm>(actor_id, pet_id, json, existing_id, None)
            }
            RecordKind::Condition => {
                self.submit_as::<ConditionForm>(actor_id, pet_id, json, existing_id, None)
            }
            RecordKind::Allergy => {
                self.submit_as::<AllergyForm>(actor_id, pet_id, json, existing_id, None)
            }
            RecordKind::Weight => {
                let json = self.with_preferred_unit(json)?;
                self.submit_as::<WeightForm>(actor_id, pet_id, &json, existing_id, None)
            }
            RecordKind::Document => {
                self.submit_as::<DocumentForm>(actor_id, pet_id, json, existing_id, None)
            }
            RecordKind::Visit => {
                self.submit_as::<VisitForm>(actor_id, pet_id, json, existing_id, None)
            }
        }
    }

    /// Delete a record and log who deleted it.
    pub fn delete_record(
        &self,
        actor_id: String,
        pet_id: String,
        kind: String,
        record_id: String,
        record_name: String,
    ) -> Result<(), PetRecordsError> {
        let kind = parse_kind(&kind)?;
        block_on(store::delete_record(
            &self.store,
            &self.store,
            &actor_id,
            &pet_id,
            kind,
            &record_id,
            &record_name,
        ))?;
        Ok(())
    }

    /// Warnings for giving `medication_name` to a pet.
    pub fn check_interactions(
        &self,
        pet_id: String,
        medication_name: String,
    ) -> Vec<FfiWarning> {
        block_on(self.advisor().check_interactions(&medication_name, &pet_id))
            .into_iter()
            .map(|w| w.into())
            .collect()
    }

    // =========================================================================
    // Timeline Operations
    // =========================================================================

    /// Merged history for a pet, newest first.
    ///
    /// `filter` is "all" or a kind tag; `today` defaults to the current UTC date.
    pub fn pet_timeline(
        &self,
        pet_id: String,
        filter: String,
        today: Option<String>,
    ) -> Result<Vec<FfiTimelineEvent>, PetRecordsError> {
        let filter: TimelineFilter = filter.parse().map_err(PetRecordsError::InvalidInput)?;
        let today = parse_today(today)?;
        let pet = self.require_pet(&pet_id)?;

        let sources = self.collect_sources(&pet)?;
        let events = TimelineAggregator::new(&self.config).build(&sources, today);
        Ok(filter_timeline(&events, filter)
            .into_iter()
            .map(|e| e.into())
            .collect())
    }

    /// Vaccinations due soon or expired, soonest first.
    pub fn upcoming_vaccinations(
        &self,
        pet_id: String,
        today: Option<String>,
    ) -> Result<Vec<FfiDueItem>, PetRecordsError> {
        let today = parse_today(today)?;
        self.require_pet(&pet_id)?;
        let vaccinations = block_on(fetch_records::<VaccinationForm>(&self.store, &pet_id))?;
        Ok(
            timeline::upcoming_due(&vaccinations, today, self.config.due_soon_days)
                .into_iter()
                .map(|item| item.into())
                .collect(),
        )
    }

    // =========================================================================
    // Schedule Operations
    // =========================================================================

    /// Next due date (YYYY-MM-DD) from a base date and interval text.
    pub fn compute_next_due(
        &self,
        base_date: String,
        interval: Option<String>,
    ) -> Result<Option<String>, PetRecordsError> {
        let base = parse_date(&base_date)?;
        Ok(schedule::compute_next_due(base, interval.as_deref()).map(|d| d.to_string()))
    }

    /// Due status tag ("active", "due_soon", "expired", "none").
    pub fn classify_due_status(
        &self,
        due_date: Option<String>,
        today: Option<String>,
    ) -> Result<String, PetRecordsError> {
        let due = due_date.as_deref().map(parse_date).transpose()?;
        let today = parse_today(today)?;
        let status =
            schedule::classify_due_status_within(due, today, self.config.due_soon_days);
        Ok(status.as_str().to_string())
    }

    /// Reference vaccines matching `query`, best first.
    pub fn search_reference_vaccines(
        &self,
        query: String,
        species: Option<String>,
        limit: u32,
    ) -> Vec<FfiReferenceVaccine> {
        self.catalog
            .search(&query, species.as_deref(), limit as usize)
            .into_iter()
            .map(|m| m.vaccine.into())
            .collect()
    }
}

fn parse_kind(kind: &str) -> Result<RecordKind, PetRecordsError> {
    kind.parse()
        .map_err(|e: models::DecodeError| PetRecordsError::InvalidInput(e.to_string()))
}

fn parse_date(value: &str) -> Result<NaiveDate, PetRecordsError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| PetRecordsError::InvalidInput(format!("Bad date {:?}: {}", value, e)))
}

fn parse_today(today: Option<String>) -> Result<NaiveDate, PetRecordsError> {
    match today {
        Some(value) => parse_date(&value),
        None => Ok(Utc::now().date_naive()),
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe pet.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPet {
    pub id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub date_of_birth: Option<String>,
    pub owner_id: Option<String>,
    pub created_at: String,
}

impl From<Pet> for FfiPet {
    fn from(pet: Pet) -> Self {
        Self {
            id: pet.id,
            name: pet.name,
            species: pet.species,
            breed: pet.breed,
            date_of_birth: pet.date_of_birth.map(|d| d.to_string()),
            owner_id: pet.owner_id,
            created_at: pet.created_at.to_rfc3339(),
        }
    }
}

/// FFI-safe advisory warning.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiWarning {
    /// "allergy_conflict" or "polypharmacy"
    pub kind: String,
    pub severity: String,
    pub message: String,
}

impl From<AdvisoryWarning> for FfiWarning {
    fn from(warning: AdvisoryWarning) -> Self {
        let kind = match warning.kind {
            WarningKind::AllergyConflict { .. } => "allergy_conflict",
            WarningKind::Polypharmacy { .. } => "polypharmacy",
        };
        let severity = match warning.severity {
            WarningSeverity::Info => "info",
            WarningSeverity::Caution => "caution",
            WarningSeverity::Critical => "critical",
        };
        Self {
            kind: kind.to_string(),
            severity: severity.to_string(),
            message: warning.message,
        }
    }
}

/// FFI-safe field error, already translated.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFieldError {
    pub field: String,
    pub message: String,
}

/// FFI-safe submit outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSubmitResult {
    /// "saved", "invalid", "needs_confirmation", "failed" or "ignored"
    pub status: String,
    pub record_id: Option<String>,
    pub field_errors: Vec<FfiFieldError>,
    pub warnings: Vec<FfiWarning>,
    pub error: Option<String>,
}

impl FfiSubmitResult {
    fn from_outcome(outcome: SubmitOutcome, translator: &dyn Translator) -> Self {
        let mut result = Self {
            status: String::new(),
            record_id: None,
            field_errors: Vec::new(),
            warnings: Vec::new(),
            error: None,
        };
        match outcome {
            SubmitOutcome::Saved(record) => {
                result.status = "saved".into();
                result.record_id = Some(record.id);
            }
            SubmitOutcome::Invalid(errors) => {
                result.status = "invalid".into();
                result.field_errors = errors
                    .into_iter()
                    .map(|(field, key)| FfiFieldError {
                        field,
                        message: translator.t(&key),
                    })
                    .collect();
            }
            SubmitOutcome::NeedsConfirmation(warnings) => {
                result.status = "needs_confirmation".into();
                result.warnings = warnings.into_iter().map(|w| w.into()).collect();
            }
            SubmitOutcome::Failed(message) => {
                result.status = "failed".into();
                result.error = Some(message);
            }
            SubmitOutcome::Ignored => result.status = "ignored".into(),
        }
        result
    }
}

/// FFI-safe timeline event.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTimelineEvent {
    pub id: String,
    pub kind: String,
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub status: Option<String>,
}

impl From<TimelineEvent> for FfiTimelineEvent {
    fn from(event: TimelineEvent) -> Self {
        Self {
            id: event.id,
            kind: event.kind.as_str().to_string(),
            title: event.title,
            description: event.description,
            date: event.date.to_string(),
            status: event.status.map(|s| s.as_str().to_string()),
        }
    }
}

/// FFI-safe due vaccination.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDueItem {
    pub record_id: String,
    pub vaccine_name: String,
    pub due_date: String,
    pub status: String,
}

impl From<timeline::DueItem> for FfiDueItem {
    fn from(item: timeline::DueItem) -> Self {
        Self {
            record_id: item.record_id,
            vaccine_name: item.vaccine_name,
            due_date: item.due_date.to_string(),
            status: item.status.as_str().to_string(),
        }
    }
}

/// FFI-safe reference vaccine.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReferenceVaccine {
    pub name: String,
    pub category: String,
    pub booster_interval: Option<String>,
}

impl From<ReferenceVaccine> for FfiReferenceVaccine {
    fn from(vaccine: ReferenceVaccine) -> Self {
        let category = match vaccine.category {
            models::VaccineCategory::Core => "core",
            models::VaccineCategory::NonCore => "non_core",
            models::VaccineCategory::Lifestyle => "lifestyle",
        };
        Self {
            name: vaccine.name,
            category: category.to_string(),
            booster_interval: vaccine.booster_interval,
        }
    }
}
