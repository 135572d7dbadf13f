//! Chronological health history.
//!
//! The aggregator merges already-fetched record collections of every kind
//! into one list of [`TimelineEvent`]s, newest first. It does no I/O.

mod event;

pub use event::*;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::models::{non_blank, Record, VaccinationForm};
use crate::schedule::{DueStatus, DEFAULT_DUE_SOON_DAYS};

/// Builds timelines with a configurable due-soon window.
#[derive(Debug, Clone, Copy)]
pub struct TimelineAggregator {
    due_soon_days: i64,
}

impl Default for TimelineAggregator {
    fn default() -> Self {
        Self {
            due_soon_days: DEFAULT_DUE_SOON_DAYS,
        }
    }
}

impl TimelineAggregator {
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            due_soon_days: config.due_soon_days,
        }
    }

    /// Merge every batch in `sources` into a list sorted newest first.
    ///
    /// The sort is stable: events on the same date keep the order in which
    /// their batches were supplied.
    pub fn build(&self, sources: &TimelineSources, today: NaiveDate) -> Vec<TimelineEvent> {
        let mut events = Vec::new();
        for batch in &sources.batches {
            self.collect(batch, today, &mut events);
        }
        events.sort_by(|a, b| b.date.cmp(&a.date));
        events
    }

    fn collect(&self, batch: &SourceBatch, today: NaiveDate, out: &mut Vec<TimelineEvent>) {
        match batch {
            SourceBatch::Vaccinations(records) => out.extend(records.iter().map(|r| {
                event(
                    TimelineKind::Vaccination,
                    r,
                    r.data.vaccine_name.clone(),
                    non_blank(&r.data.notes).map(str::to_string),
                    r.data.date_given,
                    Some(StatusTag::Due(r.data.due_status(today, self.due_soon_days))),
                )
            })),
            SourceBatch::Medications(records) => out.extend(records.iter().map(|r| {
                let dosing: Vec<&str> = [non_blank(&r.data.dosage), non_blank(&r.data.frequency)]
                    .into_iter()
                    .flatten()
                    .collect();
                let description = if dosing.is_empty() {
                    non_blank(&r.data.notes).map(str::to_string)
                } else {
                    Some(dosing.join(", "))
                };
                event(
                    TimelineKind::Medication,
                    r,
                    r.data.medication_name.clone(),
                    description,
                    r.data.start_date,
                    Some(StatusTag::Course(r.data.status(today))),
                )
            })),
            SourceBatch::Treatments(records) => out.extend(records.iter().map(|r| {
                event(
                    TimelineKind::Treatment,
                    r,
                    r.data.treatment_name.clone(),
                    non_blank(&r.data.notes).map(str::to_string),
                    r.data.start_date,
                    Some(StatusTag::Course(r.data.status(today))),
                )
            })),
            SourceBatch::Conditions(records) => out.extend(records.iter().map(|r| {
                event(
                    TimelineKind::Condition,
                    r,
                    r.data.name.clone(),
                    non_blank(&r.data.notes).map(str::to_string),
                    r.data.diagnosed_date,
                    Some(StatusTag::Condition(r.data.status)),
                )
            })),
            SourceBatch::Allergies(records) => out.extend(records.iter().map(|r| {
                event(
                    TimelineKind::Allergy,
                    r,
                    r.data.allergen.clone(),
                    non_blank(&r.data.reaction).map(str::to_string),
                    None,
                    None,
                )
            })),
            SourceBatch::Weights(records) => out.extend(records.iter().map(|r| {
                event(
                    TimelineKind::Weight,
                    r,
                    format!("{:.1} kg", r.data.weight_kg()),
                    non_blank(&r.data.notes).map(str::to_string),
                    r.data.date,
                    None,
                )
            })),
            SourceBatch::Documents(records) => out.extend(records.iter().map(|r| {
                event(
                    TimelineKind::Document,
                    r,
                    r.data.title(),
                    non_blank(&r.data.document_type).map(str::to_string),
                    None,
                    None,
                )
            })),
            SourceBatch::Visits(records) => out.extend(records.iter().map(|r| {
                let place: Vec<&str> = [non_blank(&r.data.clinic), non_blank(&r.data.veterinarian)]
                    .into_iter()
                    .flatten()
                    .collect();
                let description = if place.is_empty() {
                    non_blank(&r.data.notes).map(str::to_string)
                } else {
                    Some(place.join(" - "))
                };
                event(
                    TimelineKind::Visit,
                    r,
                    r.data.reason.clone(),
                    description,
                    r.data.visit_date,
                    None,
                )
            })),
            SourceBatch::Profile(marker) => out.push(TimelineEvent {
                id: format!("{}{}", TimelineKind::ProfileCreated.id_prefix(), marker.pet_id),
                kind: TimelineKind::ProfileCreated,
                title: marker.pet_name.clone(),
                description: None,
                date: utc_date(marker.created_at),
                status: None,
            }),
        }
    }
}

fn event<T>(
    kind: TimelineKind,
    record: &Record<T>,
    title: String,
    description: Option<String>,
    date: Option<NaiveDate>,
    status: Option<StatusTag>,
) -> TimelineEvent {
    TimelineEvent {
        id: format!("{}{}", kind.id_prefix(), record.id),
        kind,
        title,
        description,
        date: date.unwrap_or_else(|| utc_date(record.created_at)),
        status,
    }
}

fn utc_date(at: DateTime<Utc>) -> NaiveDate {
    at.date_naive()
}

/// Build a timeline with the default due-soon window.
pub fn build_timeline(sources: &TimelineSources, today: NaiveDate) -> Vec<TimelineEvent> {
    TimelineAggregator::default().build(sources, today)
}

/// Keep events matching `filter`, preserving order.
pub fn filter_timeline(events: &[TimelineEvent], filter: TimelineFilter) -> Vec<TimelineEvent> {
    match filter {
        TimelineFilter::All => events.to_vec(),
        _ => events.iter().filter(|e| filter.matches(e)).cloned().collect(),
    }
}

/// Events of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthGroup {
    pub year: i32,
    pub month: u32,
    pub events: Vec<TimelineEvent>,
}

/// Group consecutive events by calendar month, preserving order.
pub fn group_by_month(events: &[TimelineEvent]) -> Vec<MonthGroup> {
    let mut groups: Vec<MonthGroup> = Vec::new();
    for event in events {
        let (year, month) = (event.date.year(), event.date.month());
        match groups.last_mut() {
            Some(group) if group.year == year && group.month == month => {
                group.events.push(event.clone());
            }
            _ => groups.push(MonthGroup {
                year,
                month,
                events: vec![event.clone()],
            }),
        }
    }
    groups
}

/// A vaccination that needs attention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueItem {
    pub record_id: String,
    pub vaccine_name: String,
    pub due_date: NaiveDate,
    pub status: DueStatus,
}

/// Vaccinations that are due soon or expired, soonest first.
pub fn upcoming_due(
    vaccinations: &[Record<VaccinationForm>],
    today: NaiveDate,
    window_days: i64,
) -> Vec<DueItem> {
    let mut items: Vec<DueItem> = vaccinations
        .iter()
        .filter_map(|r| {
            let due_date = r.data.next_due_date?;
            let status = r.data.due_status(today, window_days);
            status.needs_attention().then(|| DueItem {
                record_id: r.id.clone(),
                vaccine_name: r.data.vaccine_name.clone(),
                due_date,
                status,
            })
        })
        .collect();
    items.sort_by_key(|item| item.due_date);
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AllergyForm, ConditionStatus, CourseStatus, MedicationForm, WeightForm, WeightUnit,
    };
    use chrono::TimeZone;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn record<T>(id: &str, data: T) -> Record<T> {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        Record {
            id: id.into(),
            pet_id: "pet-1".into(),
            created_at: at,
            updated_at: at,
            data,
        }
    }

    fn vaccination(id: &str, given: &str, next: Option<&str>) -> Record<VaccinationForm> {
        record(
            id,
            VaccinationForm {
                vaccine_name: format!("Vaccine {}", id),
                date_given: Some(d(given)),
                next_due_date: next.map(d),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_empty_sources() {
        assert!(build_timeline(&TimelineSources::new(), d("2024-06-01")).is_empty());
    }

    #[test]
    fn test_sorted_descending_with_prefixes() {
        let sources = TimelineSources::new()
            .with(SourceBatch::Vaccinations(vec![vaccination("1", "2024-03-01", None)]))
            .with(SourceBatch::Medications(vec![record(
                "1",
                MedicationForm {
                    medication_name: "Apoquel".into(),
                    dosage: Some("16mg".into()),
                    frequency: Some("daily".into()),
                    start_date: Some(d("2024-05-01")),
                    ..Default::default()
                },
            )]));

        let events = build_timeline(&sources, d("2024-06-01"));
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "med-1");
        assert_eq!(events[0].description.as_deref(), Some("16mg, daily"));
        assert_eq!(events[0].status, Some(StatusTag::Course(CourseStatus::Active)));
        assert_eq!(events[1].id, "vacc-1");
        assert_eq!(events[1].status, Some(StatusTag::Due(DueStatus::None)));
    }

    #[test]
    fn test_missing_date_uses_created_at() {
        let sources = TimelineSources::new().with(SourceBatch::Allergies(vec![record(
            "a",
            AllergyForm {
                allergen: "Chicken".into(),
                ..Default::default()
            },
        )]));

        let events = build_timeline(&sources, d("2024-06-01"));
        assert_eq!(events[0].date, d("2024-01-15"));
        assert_eq!(events[0].id, "allergy-a");
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let sources = TimelineSources::new()
            .with(SourceBatch::Vaccinations(vec![
                vaccination("a", "2024-03-01", None),
                vaccination("b", "2024-03-01", None),
            ]))
            .with(SourceBatch::Conditions(vec![record(
                "c",
                crate::models::ConditionForm {
                    name: "Otitis".into(),
                    status: ConditionStatus::Recurring,
                    diagnosed_date: Some(d("2024-03-01")),
                    ..Default::default()
                },
            )]));

        let ids: Vec<String> = build_timeline(&sources, d("2024-06-01"))
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["vacc-a", "vacc-b", "cond-c"]);
    }

    #[test]
    fn test_weight_title_in_kg() {
        let sources = TimelineSources::new().with(SourceBatch::Weights(vec![record(
            "w",
            WeightForm {
                weight: 22.0,
                unit: WeightUnit::Pounds,
                date: Some(d("2024-04-01")),
                notes: None,
            },
        )]));

        let events = build_timeline(&sources, d("2024-06-01"));
        assert_eq!(events[0].title, "10.0 kg");
    }

    #[test]
    fn test_profile_marker() {
        let marker = ProfileMarker {
            pet_id: "pet-1".into(),
            pet_name: "Rex".into(),
            created_at: Utc.with_ymd_and_hms(2023, 12, 31, 23, 0, 0).unwrap(),
        };
        let sources = TimelineSources::new()
            .with_profile(marker)
            .with(SourceBatch::Vaccinations(vec![vaccination("1", "2024-03-01", None)]));

        let events = build_timeline(&sources, d("2024-06-01"));
        let last = events.last().unwrap();
        assert_eq!(last.kind, TimelineKind::ProfileCreated);
        assert_eq!(last.id, "profile-pet-1");
        assert_eq!(last.title, "Rex");
        assert_eq!(last.date, d("2023-12-31"));
    }

    #[test]
    fn test_filter() {
        let sources = TimelineSources::new()
            .with(SourceBatch::Vaccinations(vec![vaccination("1", "2024-03-01", None)]))
            .with(SourceBatch::Allergies(vec![record("a", AllergyForm::default())]));
        let events = build_timeline(&sources, d("2024-06-01"));

        assert_eq!(filter_timeline(&events, TimelineFilter::All), events);
        let only = filter_timeline(&events, TimelineFilter::Kind(TimelineKind::Allergy));
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].kind, TimelineKind::Allergy);
        assert!(filter_timeline(&events, TimelineFilter::Kind(TimelineKind::Visit)).is_empty());
    }

    #[test]
    fn test_filter_from_str() {
        assert_eq!("all".parse::<TimelineFilter>(), Ok(TimelineFilter::All));
        assert_eq!(
            "profile_created".parse::<TimelineFilter>(),
            Ok(TimelineFilter::Kind(TimelineKind::ProfileCreated))
        );
        assert!("vaccinations".parse::<TimelineFilter>().is_err());
    }

    #[test]
    fn test_group_by_month() {
        let sources = TimelineSources::new().with(SourceBatch::Vaccinations(vec![
            vaccination("1", "2024-03-01", None),
            vaccination("2", "2024-03-20", None),
            vaccination("3", "2024-01-05", None),
        ]));
        let groups = group_by_month(&build_timeline(&sources, d("2024-06-01")));

        assert_eq!(groups.len(), 2);
        assert_eq!((groups[0].year, groups[0].month), (2024, 3));
        assert_eq!(groups[0].events.len(), 2);
        assert_eq!(groups[0].events[0].id, "vacc-2");
        assert_eq!((groups[1].year, groups[1].month), (2024, 1));
    }

    #[test]
    fn test_upcoming_due() {
        let vaccinations = vec![
            vaccination("far", "2024-01-01", Some("2025-01-01")),
            vaccination("soon", "2023-06-20", Some("2024-06-20")),
            vaccination("late", "2023-05-01", Some("2024-05-01")),
            vaccination("once", "2024-01-01", None),
        ];

        let items = upcoming_due(&vaccinations, d("2024-06-01"), 30);
        let ids: Vec<&str> = items.iter().map(|i| i.record_id.as_str()).collect();
        assert_eq!(ids, vec!["late", "soon"]);
        assert_eq!(items[0].status, DueStatus::Expired);
        assert_eq!(items[1].status, DueStatus::DueSoon);
    }
}
