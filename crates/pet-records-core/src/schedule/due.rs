//! Next-due date computation and urgency classification.
//!
//! Intervals are written as `"<n> <unit>"` where unit is day, week, month or
//! year (singular or plural, any case), or the aliases `annual` / `annually`.
//! Month and year steps keep the day of month, clamped to the end of shorter
//! months.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Default lookahead, in days, for flagging a due date as due soon.
pub const DEFAULT_DUE_SOON_DAYS: i64 = 30;

/// Calendar unit of a recurrence interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    Day,
    Week,
    Month,
    Year,
}

/// A parsed recurrence interval, e.g. 12 months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceInterval {
    pub count: u32,
    pub unit: IntervalUnit,
}

impl RecurrenceInterval {
    /// Advance `base` by this interval. `None` only on calendar overflow.
    pub fn advance(&self, base: NaiveDate) -> Option<NaiveDate> {
        let count = u64::from(self.count);
        match self.unit {
            IntervalUnit::Day => base.checked_add_days(Days::new(count)),
            IntervalUnit::Week => base.checked_add_days(Days::new(count.checked_mul(7)?)),
            IntervalUnit::Month => base.checked_add_months(Months::new(self.count)),
            IntervalUnit::Year => {
                base.checked_add_months(Months::new(self.count.checked_mul(12)?))
            }
        }
    }
}

/// Parse an interval description. Zero-length intervals are not recurrences.
pub fn parse_interval(input: &str) -> Option<RecurrenceInterval> {
    let normalized = input.trim().to_lowercase();

    if matches!(normalized.as_str(), "annual" | "annually") {
        return Some(RecurrenceInterval {
            count: 1,
            unit: IntervalUnit::Year,
        });
    }

    let mut parts = normalized.split_whitespace();
    let count: u32 = parts.next()?.parse().ok()?;
    let unit = parse_unit(parts.next()?)?;
    if parts.next().is_some() || count == 0 {
        return None;
    }

    Some(RecurrenceInterval { count, unit })
}

fn parse_unit(word: &str) -> Option<IntervalUnit> {
    match word {
        "day" | "days" => Some(IntervalUnit::Day),
        "week" | "weeks" => Some(IntervalUnit::Week),
        "month" | "months" => Some(IntervalUnit::Month),
        "year" | "years" => Some(IntervalUnit::Year),
        _ => None,
    }
}

/// Next due date for a dose given on `base`, or `None` when the interval is
/// absent or not understood.
pub fn compute_next_due(base: NaiveDate, interval: Option<&str>) -> Option<NaiveDate> {
    parse_interval(interval?)?.advance(base)
}

/// Urgency of a due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Active,
    DueSoon,
    Expired,
    /// No due date recorded
    None,
}

impl DueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DueStatus::Active => "active",
            DueStatus::DueSoon => "due_soon",
            DueStatus::Expired => "expired",
            DueStatus::None => "none",
        }
    }

    /// Due soon or already expired.
    pub fn needs_attention(&self) -> bool {
        matches!(self, DueStatus::DueSoon | DueStatus::Expired)
    }
}

/// Classify `due` against `now` using the default 30-day window.
pub fn classify_due_status(due: Option<NaiveDate>, now: NaiveDate) -> DueStatus {
    classify_due_status_within(due, now, DEFAULT_DUE_SOON_DAYS)
}

/// Classify `due` against `now`. The window boundary is inclusive.
pub fn classify_due_status_within(
    due: Option<NaiveDate>,
    now: NaiveDate,
    window_days: i64,
) -> DueStatus {
    let Some(due) = due else {
        return DueStatus::None;
    };

    if due < now {
        DueStatus::Expired
    } else if (due - now).num_days() <= window_days {
        DueStatus::DueSoon
    } else {
        DueStatus::Active
    }
}
