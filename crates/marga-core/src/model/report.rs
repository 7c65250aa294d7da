use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::numeric::lenient_f64;

/// Quantity of one BoQ item completed during a single reporting period.
///
/// This is a delta, never a running total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemProgress {
    pub boq_item_id: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
}

impl ItemProgress {
    #[must_use]
    pub fn new(boq_item_id: impl Into<String>, quantity: f64) -> Self {
        Self {
            boq_item_id: boq_item_id.into(),
            quantity,
        }
    }
}

/// An accepted weekly report.
///
/// Reports are immutable once saved; the only mutation is deletion. No
/// derived progress is stored here: weekly and cumulative figures are
/// recomputed from the ordered report sequence on every read (see
/// [`report_ledger`](crate::progress::report_ledger)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    pub id: String,
    pub week_number: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub work_description: String,
    #[serde(default)]
    pub item_progress: Vec<ItemProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl WeeklyReport {
    /// Chronological ordering: week number, then creation time, then id.
    ///
    /// Week numbers are operator-assigned and may repeat, so creation time and
    /// id break ties to keep the order total and deterministic.
    #[must_use]
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        self.week_number
            .cmp(&other.week_number)
            .then_with(|| self.created_at.cmp(&other.created_at))
            .then_with(|| self.id.cmp(&other.id))
    }

    /// The instant this report counts as "last reported" for staleness:
    /// `created_at`, falling back to midnight UTC at the end of the period.
    #[must_use]
    pub fn reported_at(&self) -> DateTime<Utc> {
        self.created_at
            .unwrap_or_else(|| crate::schedule::clock::start_of_day(self.end_date))
    }
}

/// Sort reports chronologically, returning borrowed references.
#[must_use]
pub fn chronological(reports: &[WeeklyReport]) -> Vec<&WeeklyReport> {
    let mut ordered: Vec<&WeeklyReport> = reports.iter().collect();
    ordered.sort_by(|a, b| a.chronological_cmp(b));
    ordered
}

/// A candidate weekly report, as entered by an operator and not yet accepted.
///
/// Every header field is optional so the validator can report which ones
/// are missing instead of failing at parse time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportDraft {
    pub week_number: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub work_description: String,
    pub item_progress: Vec<ItemProgress>,
}

impl ReportDraft {
    /// Convenience constructor for a fully specified header.
    #[must_use]
    pub fn new(week_number: u32, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            week_number: Some(week_number),
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Self::default()
        }
    }

    /// Builder-style helper that appends one item entry.
    #[must_use]
    pub fn with_item(mut self, boq_item_id: impl Into<String>, quantity: f64) -> Self {
        self.item_progress.push(ItemProgress::new(boq_item_id, quantity));
        self
    }
}
