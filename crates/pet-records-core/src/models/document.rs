//! Document and visit records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::{
    non_blank, require, require_text, FieldErrors, RecordForm, RecordKind, MSG_REQUIRED,
};

/// Metadata of an uploaded document. The file itself lives elsewhere.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentForm {
    pub name: String,
    pub file_name: Option<String>,
    /// e.g. "lab_result", "invoice", "certificate"
    #[serde(rename = "type")]
    pub document_type: Option<String>,
    pub notes: Option<String>,
}

impl DocumentForm {
    /// `name`, falling back to the file name.
    pub fn title(&self) -> String {
        let name = self.name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        non_blank(&self.file_name).unwrap_or_default().to_string()
    }
}

impl RecordForm for DocumentForm {
    const KIND: RecordKind = RecordKind::Document;

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.title().is_empty() {
            errors.insert("name".into(), MSG_REQUIRED.into());
        }
        errors
    }

    fn display_name(&self) -> String {
        self.title()
    }
}

/// Editable field set of a vet visit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisitForm {
    pub reason: String,
    pub visit_date: Option<NaiveDate>,
    pub clinic: Option<String>,
    pub veterinarian: Option<String>,
    pub notes: Option<String>,
}

impl RecordForm for VisitForm {
    const KIND: RecordKind = RecordKind::Visit;

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, "reason", &self.reason);
        require(&mut errors, "visit_date", &self.visit_date);
        errors
    }

    fn display_name(&self) -> String {
        self.reason.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_title_falls_back_to_file_name() {
        let doc = DocumentForm {
            name: " ".into(),
            file_name: Some("bloodwork.pdf".into()),
            ..Default::default()
        };
        assert_eq!(doc.title(), "bloodwork.pdf");
        assert!(doc.validate().is_empty());
    }

    #[test]
    fn test_document_needs_some_name() {
        assert!(DocumentForm::default().validate().contains_key("name"));
    }

    #[test]
    fn test_document_type_serializes_as_type() {
        let doc = DocumentForm {
            name: "Invoice".into(),
            document_type: Some("invoice".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["type"], "invoice");
    }

    #[test]
    fn test_visit_validation() {
        let errors = VisitForm::default().validate();
        assert!(errors.contains_key("reason"));
        assert!(errors.contains_key("visit_date"));
    }
}
