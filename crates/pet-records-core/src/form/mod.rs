//! Record-entry engine.
//!
//! One submit lifecycle shared by every record kind:
//!
//! ```text
//! submit ─► validate ──errors──► Invalid (no I/O)
//!              │
//!              ▼
//!          intercept ──warnings──► AwaitingConfirmation ──cancel──► Editing
//!              │                          │
//!              │                       proceed
//!              ▼                          │
//!          create / update ◄──────────────┘
//!              │
//!        ok ───┴─── err
//!        │           │
//!   activity log   Failed (form stays open)
//!   on_success
//!   Closed
//! ```
//!
//! Insert and update share the path; an engine built with
//! [`FormEngine::for_existing`] updates, one built with [`FormEngine::new`]
//! inserts.

mod state;

pub use state::*;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::advisor::AdvisoryWarning;
use crate::models::{ActivityAction, ActivityEntry, FieldErrors, Record, RecordForm, StoredRecord};
use crate::store::{append_best_effort, ActivityLog, RecordRepository};

/// Caller-supplied validator.
pub type Validator<F> = Arc<dyn Fn(&F) -> FieldErrors + Send + Sync>;

/// Called with the stored record after a successful save.
pub type SuccessCallback = Box<dyn Fn(&StoredRecord) + Send + Sync>;

/// Pre-persistence check that may raise advisory warnings.
#[async_trait]
pub trait Interceptor<F>: Send + Sync {
    async fn intercept(&self, pet_id: &str, data: &F) -> Vec<AdvisoryWarning>;
}

/// Collaborators shared by every form a screen opens.
#[derive(Clone)]
pub struct FormContext {
    pub repo: Arc<dyn RecordRepository>,
    pub activity: Arc<dyn ActivityLog>,
    /// Account performing the edits
    pub actor_id: String,
}

impl FormContext {
    pub fn new(
        repo: Arc<dyn RecordRepository>,
        activity: Arc<dyn ActivityLog>,
        actor_id: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            activity,
            actor_id: actor_id.into(),
        }
    }
}

/// Generic form state machine bound to one pet and one record kind.
pub struct FormEngine<F: RecordForm> {
    context: FormContext,
    pet_id: String,
    /// Set when editing an existing record
    existing_id: Option<String>,
    validator: Validator<F>,
    interceptor: Option<Arc<dyn Interceptor<F>>>,
    on_success: Option<SuccessCallback>,
    state: Mutex<FormState<F>>,
}

impl<F: RecordForm> FormEngine<F> {
    /// Form for a new record of `pet_id`, seeded with `initial`.
    pub fn new(context: FormContext, pet_id: impl Into<String>, initial: F) -> Self {
        Self::build(context, pet_id.into(), None, initial)
    }

    /// Form editing `record`, seeded with its current values.
    pub fn for_existing(context: FormContext, record: &Record<F>) -> Self {
        Self::build(
            context,
            record.pet_id.clone(),
            Some(record.id.clone()),
            record.data.clone(),
        )
    }

    fn build(
        context: FormContext,
        pet_id: String,
        existing_id: Option<String>,
        data: F,
    ) -> Self {
        Self {
            context,
            pet_id,
            existing_id,
            validator: Arc::new(F::validate),
            interceptor: None,
            on_success: None,
            state: Mutex::new(FormState::new(data)),
        }
    }

    /// Replace the default validator.
    pub fn with_validator(
        mut self,
        validator: impl Fn(&F) -> FieldErrors + Send + Sync + 'static,
    ) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    /// Run `interceptor` after validation and before persistence.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor<F>>) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    pub fn on_success(mut self, callback: impl Fn(&StoredRecord) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn pet_id(&self) -> &str {
        &self.pet_id
    }

    pub fn existing_id(&self) -> Option<&str> {
        self.existing_id.as_deref()
    }

    pub fn is_update(&self) -> bool {
        self.existing_id.is_some()
    }

    // =========================================================================
    // State access
    // =========================================================================

    fn lock_state(&self) -> MutexGuard<'_, FormState<F>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> FormState<F> {
        self.lock_state().clone()
    }

    pub fn data(&self) -> F {
        self.lock_state().data.clone()
    }

    pub fn errors(&self) -> FieldErrors {
        self.lock_state().errors.clone()
    }

    pub fn phase(&self) -> FormPhase {
        self.lock_state().phase
    }

    pub fn is_submitting(&self) -> bool {
        self.lock_state().submitting()
    }

    pub fn submit_error(&self) -> Option<String> {
        self.lock_state().submit_error.clone()
    }

    pub fn pending_warnings(&self) -> Vec<AdvisoryWarning> {
        self.lock_state().warnings.clone()
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Mutate the data in place. Does not validate.
    pub fn edit(&self, change: impl FnOnce(&mut F)) {
        change(&mut self.lock_state().data);
    }

    /// Shallow-merge one field, addressed by its serialized name. Does not validate.
    pub fn update_field(&self, key: &str, value: serde_json::Value) -> Result<(), FormError> {
        let mut state = self.lock_state();

        let mut fields = match serde_json::to_value(&state.data) {
            Ok(serde_json::Value::Object(fields)) => fields,
            _ => return Err(FormError::NotAnObject),
        };
        if !fields.contains_key(key) {
            return Err(FormError::UnknownField(key.to_string()));
        }
        fields.insert(key.to_string(), value);

        state.data = serde_json::from_value(serde_json::Value::Object(fields)).map_err(|source| {
            FormError::InvalidValue {
                field: key.to_string(),
                source,
            }
        })?;
        Ok(())
    }

    /// Clear one field error, e.g. after the user picks a search result.
    pub fn clear_error(&self, field: &str) {
        self.lock_state().errors.remove(field);
    }

    // =========================================================================
    // Submit lifecycle
    // =========================================================================

    /// Validate, intercept, and persist.
    ///
    /// Only one submit runs at a time; calls made while one is in flight,
    /// while warnings await confirmation, or after close return
    /// [`SubmitOutcome::Ignored`].
    pub async fn submit(&self) -> SubmitOutcome {
        let data = {
            let mut state = self.lock_state();
            if state.phase != FormPhase::Editing {
                tracing::debug!(pet_id = %self.pet_id, kind = %F::KIND, phase = ?state.phase, "submit ignored");
                return SubmitOutcome::Ignored;
            }

            let errors = (self.validator)(&state.data.normalized());
            if !errors.is_empty() {
                tracing::debug!(pet_id = %self.pet_id, kind = %F::KIND, fields = errors.len(), "validation failed");
                state.errors = errors.clone();
                return SubmitOutcome::Invalid(errors);
            }

            state.errors.clear();
            state.submit_error = None;
            state.phase = FormPhase::Submitting;
            state.data.clone()
        };

        if let Some(interceptor) = &self.interceptor {
            let warnings = interceptor.intercept(&self.pet_id, &data).await;
            if !warnings.is_empty() {
                let mut state = self.lock_state();
                state.phase = FormPhase::AwaitingConfirmation;
                state.warnings = warnings.clone();
                state.pending = Some(data);
                return SubmitOutcome::NeedsConfirmation(warnings);
            }
        }

        self.persist(data).await
    }

    /// Continue a submit paused on warnings.
    pub async fn proceed(&self) -> SubmitOutcome {
        let data = {
            let mut state = self.lock_state();
            if state.phase != FormPhase::AwaitingConfirmation {
                return SubmitOutcome::Ignored;
            }
            state.warnings.clear();
            state.phase = FormPhase::Submitting;
            match state.pending.take() {
                Some(data) => data,
                None => state.data.clone(),
            }
        };

        self.persist(data).await
    }

    /// Abandon a submit paused on warnings. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let mut state = self.lock_state();
        if state.phase != FormPhase::AwaitingConfirmation {
            return false;
        }
        state.phase = FormPhase::Editing;
        state.warnings.clear();
        state.pending = None;
        true
    }

    async fn persist(&self, data: F) -> SubmitOutcome {
        let payload = match serde_json::to_value(data.normalized()) {
            Ok(payload) => payload,
            Err(e) => return self.fail(e.to_string()),
        };

        let (result, action) = match &self.existing_id {
            Some(id) => (
                self.context.repo.update(F::KIND, id, payload).await,
                ActivityAction::RecordUpdated,
            ),
            None => (
                self.context.repo.create(F::KIND, &self.pet_id, payload).await,
                ActivityAction::RecordAdded,
            ),
        };

        let record = match result {
            Ok(record) => record,
            Err(e) => return self.fail(e.to_string()),
        };

        tracing::info!(
            pet_id = %self.pet_id,
            kind = %F::KIND,
            record_id = %record.id,
            "record {}",
            action.verb()
        );

        let entry = ActivityEntry::new(
            &self.context.actor_id,
            &self.pet_id,
            action,
            F::KIND,
            &record.id,
            data.display_name(),
        );
        append_best_effort(self.context.activity.as_ref(), entry).await;

        self.lock_state().phase = FormPhase::Closed;
        if let Some(callback) = &self.on_success {
            callback(&record);
        }
        SubmitOutcome::Saved(record)
    }

    fn fail(&self, message: String) -> SubmitOutcome {
        tracing::warn!(pet_id = %self.pet_id, kind = %F::KIND, error = %message, "record write failed");
        let mut state = self.lock_state();
        state.phase = FormPhase::Editing;
        state.submit_error = Some(message.clone());
        SubmitOutcome::Failed(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecordKind, VaccinationForm};
    use crate::store::{RepoResult, RepositoryError};
    use chrono::{NaiveDate, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store that yields once per call and counts writes.
    #[derive(Default)]
    struct SpyRepository {
        creates: AtomicUsize,
        updates: AtomicUsize,
        fail_with: Option<String>,
    }

    impl SpyRepository {
        fn stored(
            kind: RecordKind,
            id: &str,
            pet_id: &str,
            payload: serde_json::Value,
        ) -> StoredRecord {
            let now = Utc::now();
            StoredRecord {
                id: id.to_string(),
                pet_id: pet_id.to_string(),
                kind,
                payload,
                created_at: now,
                updated_at: now,
            }
        }
    }

    #[async_trait]
    impl RecordRepository for SpyRepository {
        async fn create(
            &self,
            kind: RecordKind,
            pet_id: &str,
            payload: serde_json::Value,
        ) -> RepoResult<StoredRecord> {
            tokio::task::yield_now().await;
            self.creates.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = &self.fail_with {
                return Err(RepositoryError::Backend(message.clone()));
            }
            Ok(Self::stored(kind, "new-1", pet_id, payload))
        }

        async fn update(
            &self,
            kind: RecordKind,
            id: &str,
            payload: serde_json::Value,
        ) -> RepoResult<StoredRecord> {
            tokio::task::yield_now().await;
            self.updates.fetch_add(1, Ordering::SeqCst);
            Ok(Self::stored(kind, id, "pet-1", payload))
        }

        async fn delete(&self, _kind: RecordKind, _id: &str) -> RepoResult<()> {
            Ok(())
        }

        async fn query(&self, _kind: RecordKind, _pet_id: &str) -> RepoResult<Vec<StoredRecord>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct CountingLog {
        entries: Mutex<Vec<ActivityEntry>>,
    }

    #[async_trait]
    impl ActivityLog for CountingLog {
        async fn append(&self, entry: ActivityEntry) -> RepoResult<()> {
            self.entries.lock().unwrap().push(entry);
            Ok(())
        }
    }

    fn rabies() -> VaccinationForm {
        VaccinationForm {
            vaccine_name: "Rabies".into(),
            date_given: NaiveDate::from_ymd_opt(2024, 6, 1),
            ..Default::default()
        }
    }

    fn engine(
        repo: Arc<SpyRepository>,
        log: Arc<CountingLog>,
        data: VaccinationForm,
    ) -> FormEngine<VaccinationForm> {
        FormEngine::new(FormContext::new(repo, log, "owner-1"), "pet-1", data)
    }

    #[tokio::test]
    async fn test_concurrent_submits_write_once() {
        let repo = Arc::new(SpyRepository::default());
        let log = Arc::new(CountingLog::default());
        let form = engine(repo.clone(), log.clone(), rabies());

        let (first, second) = tokio::join!(form.submit(), form.submit());

        assert!(first.is_saved());
        assert!(matches!(second, SubmitOutcome::Ignored));
        assert_eq!(repo.creates.load(Ordering::SeqCst), 1);
        assert_eq!(log.entries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_form_performs_no_io() {
        let repo = Arc::new(SpyRepository::default());
        let log = Arc::new(CountingLog::default());
        let form = engine(repo.clone(), log.clone(), VaccinationForm::default());

        let outcome = form.submit().await;

        assert!(matches!(outcome, SubmitOutcome::Invalid(ref e) if e.contains_key("vaccine_name")));
        assert_eq!(repo.creates.load(Ordering::SeqCst), 0);
        assert!(log.entries.lock().unwrap().is_empty());
        assert_eq!(form.phase(), FormPhase::Editing);
        assert!(form.errors().contains_key("date_given"));
    }

    #[tokio::test]
    async fn test_custom_validator_replaces_default() {
        let repo = Arc::new(SpyRepository::default());
        let log = Arc::new(CountingLog::default());
        let form = engine(repo.clone(), log, rabies()).with_validator(|data: &VaccinationForm| {
            let mut errors = FieldErrors::new();
            if data.lot_number.is_none() {
                errors.insert("lot_number".into(), "validation.required".into());
            }
            errors
        });

        assert!(matches!(form.submit().await, SubmitOutcome::Invalid(_)));
        assert_eq!(repo.creates.load(Ordering::SeqCst), 0);

        form.edit(|data| data.lot_number = Some("LOT-7".into()));
        assert!(form.submit().await.is_saved());
    }

    #[tokio::test]
    async fn test_update_field_merges_without_validating() {
        let repo = Arc::new(SpyRepository::default());
        let log = Arc::new(CountingLog::default());
        let form = engine(repo, log, VaccinationForm::default());

        form.update_field("vaccine_name", serde_json::json!("DHPP")).unwrap();
        form.update_field("date_given", serde_json::json!("2024-03-05")).unwrap();

        let data = form.data();
        assert_eq!(data.vaccine_name, "DHPP");
        assert_eq!(data.date_given, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert!(form.errors().is_empty());

        assert!(matches!(
            form.update_field("no_such_field", serde_json::json!(1)),
            Err(FormError::UnknownField(_))
        ));
        assert!(matches!(
            form.update_field("date_given", serde_json::json!("yesterday")),
            Err(FormError::InvalidValue { .. })
        ));
        // A rejected value leaves the data untouched
        assert_eq!(form.data().date_given, NaiveDate::from_ymd_opt(2024, 3, 5));
    }

    #[tokio::test]
    async fn test_failure_keeps_form_open_with_verbatim_message() {
        let repo = Arc::new(SpyRepository {
            fail_with: Some("duplicate key value violates unique constraint".into()),
            ..Default::default()
        });
        let log = Arc::new(CountingLog::default());
        let form = engine(repo.clone(), log.clone(), rabies());

        let outcome = form.submit().await;

        assert!(matches!(
            outcome,
            SubmitOutcome::Failed(ref m) if m == "duplicate key value violates unique constraint"
        ));
        assert_eq!(form.phase(), FormPhase::Editing);
        assert_eq!(form.data(), rabies());
        assert!(form.errors().is_empty());
        assert!(form.submit_error().is_some());
        assert!(log.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_existing_record_updates() {
        let repo = Arc::new(SpyRepository::default());
        let log = Arc::new(CountingLog::default());
        let now = Utc::now();
        let existing = Record {
            id: "vacc-42".to_string(),
            pet_id: "pet-1".to_string(),
            created_at: now,
            updated_at: now,
            data: rabies(),
        };

        let context = FormContext::new(repo.clone(), log.clone(), "owner-1");
        let form = FormEngine::for_existing(context, &existing);
        assert!(form.is_update());
        assert_eq!(form.data(), rabies());

        form.edit(|data| data.lot_number = Some("A1".into()));
        let outcome = form.submit().await;

        assert!(outcome.is_saved());
        assert_eq!(repo.updates.load(Ordering::SeqCst), 1);
        assert_eq!(repo.creates.load(Ordering::SeqCst), 0);
        let entries = log.entries.lock().unwrap();
        assert_eq!(entries[0].action, ActivityAction::RecordUpdated);
        assert_eq!(entries[0].details.record_id, "vacc-42");
    }

    #[tokio::test]
    async fn test_closed_form_ignores_submit() {
        let repo = Arc::new(SpyRepository::default());
        let log = Arc::new(CountingLog::default());
        let saved = Arc::new(AtomicUsize::new(0));
        let counter = saved.clone();
        let form = engine(repo.clone(), log, rabies()).on_success(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(form.submit().await.is_saved());
        assert_eq!(form.phase(), FormPhase::Closed);
        assert!(matches!(form.submit().await, SubmitOutcome::Ignored));
        assert_eq!(repo.creates.load(Ordering::SeqCst), 1);
        assert_eq!(saved.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear_error() {
        let repo = Arc::new(SpyRepository::default());
        let log = Arc::new(CountingLog::default());
        let form = engine(repo, log, VaccinationForm::default());

        form.submit().await;
        assert!(form.errors().contains_key("vaccine_name"));

        form.clear_error("vaccine_name");
        assert!(!form.errors().contains_key("vaccine_name"));
        assert!(form.errors().contains_key("date_given"));
    }
}
