//! Activity-log entries written after record changes.

use serde::{Deserialize, Serialize};

use super::record::RecordKind;

/// What happened to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    RecordAdded,
    RecordUpdated,
    RecordDeleted,
}

impl ActivityAction {
    pub const ALL: [ActivityAction; 3] = [
        ActivityAction::RecordAdded,
        ActivityAction::RecordUpdated,
        ActivityAction::RecordDeleted,
    ];

    /// Inverse of [`ActivityAction::as_str`].
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::RecordAdded => "record_added",
            ActivityAction::RecordUpdated => "record_updated",
            ActivityAction::RecordDeleted => "record_deleted",
        }
    }

    /// Past-tense verb used in summaries.
    pub fn verb(&self) -> &'static str {
        match self {
            ActivityAction::RecordAdded => "added",
            ActivityAction::RecordUpdated => "updated",
            ActivityAction::RecordDeleted => "deleted",
        }
    }
}

/// Structured details of an activity entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityDetails {
    pub kind: RecordKind,
    pub record_id: String,
    pub record_name: String,
}

/// One audit entry: who did what to which pet's record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEntry {
    pub actor_id: String,
    pub pet_id: String,
    pub action: ActivityAction,
    pub details: ActivityDetails,
}

impl ActivityEntry {
    pub fn new(
        actor_id: &str,
        pet_id: &str,
        action: ActivityAction,
        kind: RecordKind,
        record_id: &str,
        record_name: String,
    ) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            pet_id: pet_id.to_string(),
            action,
            details: ActivityDetails {
                kind,
                record_id: record_id.to_string(),
                record_name,
            },
        }
    }

    /// One-line summary, e.g. `added vaccination "Rabies"`.
    pub fn summary(&self) -> String {
        format!(
            "{} {} \"{}\"",
            self.action.verb(),
            self.details.kind,
            self.details.record_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let entry = ActivityEntry::new(
            "user-1",
            "pet-1",
            ActivityAction::RecordUpdated,
            RecordKind::Medication,
            "rec-9",
            "Apoquel".into(),
        );
        assert_eq!(entry.summary(), "updated medication \"Apoquel\"");
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(
            ActivityAction::parse("record_deleted"),
            Some(ActivityAction::RecordDeleted)
        );
        assert_eq!(ActivityAction::parse("deleted"), None);
    }
}
