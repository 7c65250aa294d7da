//! Progress aggregation: fold weekly reports into cumulative completion.
//!
//! Everything here is a pure function of the BoQ and the report sequence.
//! Nothing is cached on the reports themselves, so removing a report and
//! calling these functions again is the whole recomputation story.
//!
//! Two integrity rules hold for every output:
//!
//! - per-item completed quantity is clamped to the contracted quantity, so a
//!   report that slipped past validation cannot push an item beyond 100%;
//! - overall physical progress is capped at 100.
//!
//! Reports that reference a BoQ id not present in the BoQ (orphans left by a
//! deleted item) contribute nothing.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::ledger::{total_value, weight_percent};
use crate::model::report::chronological;
use crate::model::{BoqItem, WeeklyReport};

/// Cumulative reported quantity per BoQ item id.
pub type CumulativeMap = BTreeMap<String, f64>;

/// Sum `item_progress` quantities per BoQ item across `reports`.
///
/// Order does not matter. The result is the raw reported total and is not
/// clamped; see [`item_completion`] for clamped figures.
#[must_use]
pub fn cumulative_by_item<'a, I>(reports: I) -> CumulativeMap
where
    I: IntoIterator<Item = &'a WeeklyReport>,
{
    let mut map = CumulativeMap::new();
    for report in reports {
        accumulate(&mut map, report);
    }
    map
}

pub(crate) fn accumulate(map: &mut CumulativeMap, report: &WeeklyReport) {
    for entry in &report.item_progress {
        *map.entry(entry.boq_item_id.clone()).or_insert(0.0) += entry.quantity;
    }
}

/// Completed quantity for one item given a cumulative map, clamped to
/// `[0, contract quantity]`.
#[must_use]
pub fn clamped_completed(item: &BoqItem, cumulative: &CumulativeMap) -> f64 {
    let reported = cumulative.get(&item.id).copied().unwrap_or(0.0);
    reported.min(item.contract_quantity()).max(0.0)
}

/// Value of completed work: `Σ clamped_completed * unit_price`.
#[must_use]
pub fn completed_value_from(boq: &[BoqItem], cumulative: &CumulativeMap) -> f64 {
    boq.iter()
        .map(|item| clamped_completed(item, cumulative) * item.rate())
        .sum()
}

/// Value of completed work to date for `reports`.
#[must_use]
pub fn completed_value(boq: &[BoqItem], reports: &[WeeklyReport]) -> f64 {
    let cumulative = cumulative_by_item(reports);
    log_anomalies(boq, &cumulative);
    completed_value_from(boq, &cumulative)
}

/// Value-weighted physical progress in percent, `0..=100`.
///
/// Returns `0` when the BoQ is empty or worth nothing.
#[must_use]
pub fn physical_progress(boq: &[BoqItem], reports: &[WeeklyReport]) -> f64 {
    let contract_value = total_value(boq);
    if contract_value <= 0.0 {
        return 0.0;
    }
    let completed = completed_value(boq, reports);
    percent_of(completed, contract_value)
}

fn percent_of(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    (part / whole * 100.0).min(100.0)
}

/// Remaining quantity per BoQ item: `max(0, contract - reported)`.
///
/// Items with no reports map to their full contract quantity.
#[must_use]
pub fn remaining_by_item(boq: &[BoqItem], cumulative: &CumulativeMap) -> BTreeMap<String, f64> {
    boq.iter()
        .map(|item| {
            let reported = cumulative.get(&item.id).copied().unwrap_or(0.0);
            (item.id.clone(), (item.contract_quantity() - reported).max(0.0))
        })
        .collect()
}

fn log_anomalies(boq: &[BoqItem], cumulative: &CumulativeMap) {
    for (item_id, reported) in cumulative {
        match boq.iter().find(|item| &item.id == item_id) {
            None => debug!(boq_item_id = %item_id, reported, "orphaned progress entry ignored"),
            Some(item) if *reported > item.contract_quantity() => warn!(
                boq_item_id = %item_id,
                reported,
                contract = item.contract_quantity(),
                "cumulative quantity exceeds contract; clamped"
            ),
            Some(_) => {}
        }
    }
}

/// Completion state of one BoQ line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemCompletion {
    pub boq_item_id: String,
    pub item_number: String,
    pub description: String,
    pub unit: String,
    pub contract_quantity: f64,
    /// Share of the contract value carried by this line.
    pub weight_percent: f64,
    /// Raw reported total, possibly above the contract quantity.
    pub reported_quantity: f64,
    /// Reported total clamped to the contract quantity.
    pub completed_quantity: f64,
    pub remaining_quantity: f64,
    pub completed_value: f64,
    /// `completed / contract * 100`; `0` for zero-quantity lines.
    pub percent_complete: f64,
}

/// Per-item completion for every BoQ line, in BoQ order.
#[must_use]
pub fn item_completion(boq: &[BoqItem], reports: &[WeeklyReport]) -> Vec<ItemCompletion> {
    let cumulative = cumulative_by_item(reports);
    let contract_value = total_value(boq);
    boq.iter()
        .map(|item| {
            let contract_quantity = item.contract_quantity();
            let reported_quantity = cumulative.get(&item.id).copied().unwrap_or(0.0);
            let completed_quantity = clamped_completed(item, &cumulative);
            ItemCompletion {
                boq_item_id: item.id.clone(),
                item_number: item.item_number.clone(),
                description: item.description.clone(),
                unit: item.unit.clone(),
                contract_quantity,
                weight_percent: weight_percent(item, contract_value),
                reported_quantity,
                completed_quantity,
                remaining_quantity: (contract_quantity - reported_quantity).max(0.0),
                completed_value: completed_quantity * item.rate(),
                percent_complete: percent_of(completed_quantity, contract_quantity),
            }
        })
        .collect()
}

/// Derived progress figures for one report within the ordered sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportProgress {
    pub report_id: String,
    pub week_number: u32,
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    /// Value this report added on top of everything before it.
    pub weekly_value: f64,
    pub weekly_progress: f64,
    /// Completed value of this report and all earlier ones.
    pub cumulative_value: f64,
    pub cumulative_progress: f64,
}

/// Weekly and cumulative progress for every report, in chronological order.
///
/// Cumulative figures are clamped the same way [`physical_progress`] clamps
/// them, and each weekly figure is the step from the previous cumulative
/// one. Weekly values therefore always add up to the cumulative total, even
/// when some report over-claimed an item.
#[must_use]
pub fn report_ledger(boq: &[BoqItem], reports: &[WeeklyReport]) -> Vec<ReportProgress> {
    let contract_value = total_value(boq);
    let mut cumulative = CumulativeMap::new();
    let mut previous_value = 0.0;
    let mut ledger = Vec::with_capacity(reports.len());

    for report in chronological(reports) {
        accumulate(&mut cumulative, report);
        let cumulative_value = completed_value_from(boq, &cumulative);
        let weekly_value = cumulative_value - previous_value;
        ledger.push(ReportProgress {
            report_id: report.id.clone(),
            week_number: report.week_number,
            start_date: report.start_date,
            end_date: report.end_date,
            weekly_value,
            weekly_progress: percent_of(weekly_value, contract_value),
            cumulative_value,
            cumulative_progress: percent_of(cumulative_value, contract_value),
        });
        previous_value = cumulative_value;
    }

    debug!(reports = ledger.len(), contract_value, "report ledger recomputed");
    ledger
}
