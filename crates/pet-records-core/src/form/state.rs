//! Form state and submit outcomes.

use thiserror::Error;

use crate::advisor::AdvisoryWarning;
use crate::models::{FieldErrors, StoredRecord};

/// Where a form is in its submit lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    /// Accepting edits and submits
    Editing,
    /// Validation passed; interception or persistence in flight
    Submitting,
    /// Warnings shown, waiting for proceed or cancel
    AwaitingConfirmation,
    /// Saved; the form is done
    Closed,
}

/// Observable state of a form.
#[derive(Debug, Clone)]
pub struct FormState<F> {
    pub data: F,
    pub errors: FieldErrors,
    pub phase: FormPhase,
    /// Top-level persistence error, shown verbatim
    pub submit_error: Option<String>,
    /// Warnings awaiting acknowledgment
    pub warnings: Vec<AdvisoryWarning>,
    /// Data captured when interception paused the submit
    pub(crate) pending: Option<F>,
}

impl<F> FormState<F> {
    pub(crate) fn new(data: F) -> Self {
        Self {
            data,
            errors: FieldErrors::new(),
            phase: FormPhase::Editing,
            submit_error: None,
            warnings: Vec::new(),
            pending: None,
        }
    }

    pub fn submitting(&self) -> bool {
        self.phase == FormPhase::Submitting
    }
}

/// Result of `submit` or `proceed`.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Written to the store; the form is closed
    Saved(StoredRecord),
    /// Validation failed; nothing was written
    Invalid(FieldErrors),
    /// Advisory warnings need an explicit proceed or cancel
    NeedsConfirmation(Vec<AdvisoryWarning>),
    /// The store rejected the write; the form stays open for retry
    Failed(String),
    /// Another submit is in flight, or the form is not accepting submits
    Ignored,
}

impl SubmitOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SubmitOutcome::Saved(_))
    }
}

/// Errors from field updates.
#[derive(Error, Debug)]
pub enum FormError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Invalid value for {field}: {source}")]
    InvalidValue {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Form data does not serialize to an object")]
    NotAnObject,
}
