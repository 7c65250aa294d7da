//! Weekly report validation.
//!
//! A candidate report is checked against the contract window, the BoQ, and
//! the reports already accepted. Every violated rule is collected so a
//! caller can show them all at once; validation never fails with `Err`.
//!
//! # Rules
//!
//! - Week number, start date, and end date are required (week `0` counts as
//!   missing).
//! - The period must lie inside the contract window and must not be
//!   inverted.
//! - Each entry must reference a BoQ item, and must not exceed what is left
//!   of that item. Remaining capacity is consumed entry by entry, so two
//!   entries for the same item in one report share it.
//! - Entries with a quantity of zero or less are dropped without comment.
//!
//! What happens to an over-quota entry depends on [`OverQuotaPolicy`]. In
//! either case the accepted quantities never push an item past its
//! contracted quantity.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::{fmt, str::FromStr};
use tracing::debug;

use crate::model::numeric::{exceeds, finite_or_zero, fit_under, format_quantity};
use crate::model::status::{ParseEnumError, normalize};
use crate::model::{BoqItem, ContractWindow, ItemProgress, ReportDraft, WeeklyReport};
use crate::progress::cumulative_by_item;

// ---------------------------------------------------------------------------
// OverQuotaPolicy
// ---------------------------------------------------------------------------

/// What to do with an entry that claims more than the item has left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverQuotaPolicy {
    /// Reject the whole report.
    #[default]
    Reject,
    /// Accept `min(input, remaining)` and record a warning.
    Clamp,
}

impl OverQuotaPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::Clamp => "clamp",
        }
    }
}

impl fmt::Display for OverQuotaPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OverQuotaPolicy {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "reject" => Ok(Self::Reject),
            "clamp" => Ok(Self::Clamp),
            _ => Err(ParseEnumError {
                expected: "over-quota policy",
                got: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// Category of a violated rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// Week number, start date, or end date is absent.
    MissingField,
    /// The period starts before the contract does.
    StartsBeforeContract,
    /// The period ends after the contract does.
    EndsAfterContract,
    /// Start date is after end date.
    InvertedPeriod,
    /// An entry claims more than the item's remaining quantity.
    ExceedsRemaining,
    /// An entry references an id that is not in the BoQ.
    UnknownBoqItem,
}

/// One violated rule, with a message fit for an operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub kind: ViolationKind,
    pub message: String,
    /// The offending BoQ item, for per-entry violations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boq_item_id: Option<String>,
}

impl ValidationError {
    fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            boq_item_id: None,
        }
    }

    fn for_item(kind: ViolationKind, boq_item_id: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            boq_item_id: Some(boq_item_id.to_string()),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ---------------------------------------------------------------------------
// ValidationReport
// ---------------------------------------------------------------------------

/// Outcome of validating one candidate report.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Violations that block acceptance.
    pub errors: Vec<ValidationError>,
    /// Non-blocking notes, e.g. quantities clamped under
    /// [`OverQuotaPolicy::Clamp`].
    pub warnings: Vec<ValidationError>,
    /// The item entries that would be stored on acceptance, after dropping
    /// non-positive quantities and applying the over-quota policy.
    pub accepted: Vec<ItemProgress>,
}

impl ValidationReport {
    /// Returns `true` if the candidate may be accepted.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error messages in rule order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.message.clone()).collect()
    }
}

// ---------------------------------------------------------------------------
// validate_weekly_report
// ---------------------------------------------------------------------------

/// Validate `draft` against the contract `window`, the `boq`, and the
/// `existing` accepted reports.
#[must_use]
pub fn validate_weekly_report(
    draft: &ReportDraft,
    window: ContractWindow,
    boq: &[BoqItem],
    existing: &[WeeklyReport],
    policy: OverQuotaPolicy,
) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_header(draft, window, &mut report);
    check_items(draft, boq, existing, policy, &mut report);

    debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        accepted = report.accepted.len(),
        %policy,
        "weekly report validated"
    );
    report
}

fn check_header(draft: &ReportDraft, window: ContractWindow, report: &mut ValidationReport) {
    let mut missing = Vec::new();
    if draft.week_number.is_none_or(|week| week == 0) {
        missing.push("week number");
    }
    if draft.start_date.is_none() {
        missing.push("start date");
    }
    if draft.end_date.is_none() {
        missing.push("end date");
    }
    if !missing.is_empty() {
        report.errors.push(ValidationError::new(
            ViolationKind::MissingField,
            format!("Missing required field(s): {}.", missing.join(", ")),
        ));
    }

    if let Some(start) = draft.start_date
        && start < window.start_date
    {
        report.errors.push(ValidationError::new(
            ViolationKind::StartsBeforeContract,
            format!(
                "Period starts {start}, before the contract start ({}).",
                window.start_date
            ),
        ));
    }
    if let Some(end) = draft.end_date
        && end > window.end_date
    {
        report.errors.push(ValidationError::new(
            ViolationKind::EndsAfterContract,
            format!(
                "Period ends {end}, after the contract end ({}).",
                window.end_date
            ),
        ));
    }
    if let (Some(start), Some(end)) = (draft.start_date, draft.end_date)
        && start > end
    {
        report.errors.push(ValidationError::new(
            ViolationKind::InvertedPeriod,
            format!("Start date {start} is after end date {end}."),
        ));
    }
}

fn check_items(
    draft: &ReportDraft,
    boq: &[BoqItem],
    existing: &[WeeklyReport],
    policy: OverQuotaPolicy,
    report: &mut ValidationReport,
) {
    let items: HashMap<&str, &BoqItem> = boq.iter().map(|item| (item.id.as_str(), item)).collect();
    // Running totals, summed in the same order the stored reports will be.
    let mut used = cumulative_by_item(existing);

    for entry in &draft.item_progress {
        let quantity = finite_or_zero(entry.quantity);
        if quantity <= 0.0 {
            continue;
        }

        let Some(item) = items.get(entry.boq_item_id.as_str()) else {
            report.errors.push(ValidationError::for_item(
                ViolationKind::UnknownBoqItem,
                &entry.boq_item_id,
                format!("Unknown BoQ item '{}'.", entry.boq_item_id),
            ));
            continue;
        };

        let contract = item.contract_quantity();
        let so_far = used.entry(item.id.clone()).or_insert(0.0);
        let left = (contract - *so_far).max(0.0);
        let over = exceeds(quantity, left, contract);
        if over {
            let violation = ValidationError::for_item(
                ViolationKind::ExceedsRemaining,
                &item.id,
                format!(
                    "{}: quantity {} exceeds remaining {}.",
                    label(item),
                    format_quantity(quantity),
                    with_unit(left, &item.unit)
                ),
            );
            match policy {
                OverQuotaPolicy::Reject => report.errors.push(violation),
                OverQuotaPolicy::Clamp => report.warnings.push(violation),
            }
        }

        let accepted = fit_under(*so_far, if over { left } else { quantity }, contract);
        *so_far += accepted;
        if accepted > 0.0 {
            report
                .accepted
                .push(ItemProgress::new(item.id.clone(), accepted));
        }
    }
}

fn with_unit(quantity: f64, unit: &str) -> String {
    let quantity = format_quantity(quantity);
    if unit.trim().is_empty() {
        quantity
    } else {
        format!("{quantity} {unit}")
    }
}

fn label(item: &BoqItem) -> &str {
    if item.item_number.is_empty() {
        &item.id
    } else {
        &item.item_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn window() -> ContractWindow {
        ContractWindow::new(date(2024, 1, 1), date(2024, 6, 30))
    }

    fn boq() -> Vec<BoqItem> {
        let mut asphalt = BoqItem::new("asphalt", 100.0, 10.0);
        asphalt.item_number = "3.1".into();
        asphalt.unit = "m3".into();
        vec![asphalt, BoqItem::new("drain", 50.0, 20.0)]
    }

    fn accepted(id: &str, week: u32, items: &[(&str, f64)]) -> WeeklyReport {
        WeeklyReport {
            id: id.into(),
            week_number: week,
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 7),
            work_description: String::new(),
            item_progress: items
                .iter()
                .map(|(item, qty)| ItemProgress::new(*item, *qty))
                .collect(),
            created_at: None,
        }
    }

    fn draft() -> ReportDraft {
        ReportDraft::new(2, date(2024, 1, 8), date(2024, 1, 14))
    }

    fn kinds(report: &ValidationReport) -> Vec<ViolationKind> {
        report.errors.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn valid_report_is_accepted() {
        let report = validate_weekly_report(
            &draft().with_item("asphalt", 20.0),
            window(),
            &boq(),
            &[],
            OverQuotaPolicy::Reject,
        );
        assert!(report.is_ok());
        assert_eq!(report.accepted, vec![ItemProgress::new("asphalt", 20.0)]);
    }

    #[test]
    fn missing_header_fields_are_one_error() {
        let report = validate_weekly_report(
            &ReportDraft::default(),
            window(),
            &boq(),
            &[],
            OverQuotaPolicy::Reject,
        );
        assert_eq!(kinds(&report), [ViolationKind::MissingField]);
        assert!(report.errors[0].message.contains("week number"));
        assert!(report.errors[0].message.contains("end date"));
    }

    #[test]
    fn week_zero_counts_as_missing() {
        let mut candidate = draft();
        candidate.week_number = Some(0);
        let report =
            validate_weekly_report(&candidate, window(), &boq(), &[], OverQuotaPolicy::Reject);
        assert_eq!(kinds(&report), [ViolationKind::MissingField]);
    }

    #[test]
    fn end_one_day_after_contract_is_rejected() {
        let candidate = ReportDraft::new(26, date(2024, 6, 25), date(2024, 7, 1));
        let report =
            validate_weekly_report(&candidate, window(), &boq(), &[], OverQuotaPolicy::Reject);
        assert_eq!(kinds(&report), [ViolationKind::EndsAfterContract]);
    }

    #[test]
    fn collects_every_violation() {
        let candidate = ReportDraft::new(1, date(2023, 12, 31), date(2023, 12, 20))
            .with_item("asphalt", 150.0)
            .with_item("ghost", 1.0);
        let report =
            validate_weekly_report(&candidate, window(), &boq(), &[], OverQuotaPolicy::Reject);
        assert_eq!(
            kinds(&report),
            [
                ViolationKind::StartsBeforeContract,
                ViolationKind::InvertedPeriod,
                ViolationKind::ExceedsRemaining,
                ViolationKind::UnknownBoqItem,
            ]
        );
    }

    #[test]
    fn over_quota_message_names_item_and_remaining() {
        let existing = vec![accepted("wr-1", 1, &[("asphalt", 80.0)])];
        let report = validate_weekly_report(
            &draft().with_item("asphalt", 30.0),
            window(),
            &boq(),
            &existing,
            OverQuotaPolicy::Reject,
        );
        assert!(!report.is_ok());
        assert_eq!(
            report.errors[0].message,
            "3.1: quantity 30 exceeds remaining 20 m3."
        );
        assert_eq!(report.errors[0].boq_item_id.as_deref(), Some("asphalt"));
    }

    #[test]
    fn clamp_policy_accepts_remaining_with_warning() {
        let existing = vec![accepted("wr-1", 1, &[("asphalt", 80.0)])];
        let report = validate_weekly_report(
            &draft().with_item("asphalt", 30.0),
            window(),
            &boq(),
            &existing,
            OverQuotaPolicy::Clamp,
        );
        assert!(report.is_ok());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.accepted, vec![ItemProgress::new("asphalt", 20.0)]);
    }

    #[test]
    fn clamp_policy_drops_entry_with_nothing_left() {
        let existing = vec![accepted("wr-1", 1, &[("drain", 50.0)])];
        let report = validate_weekly_report(
            &draft().with_item("drain", 5.0),
            window(),
            &boq(),
            &existing,
            OverQuotaPolicy::Clamp,
        );
        assert!(report.is_ok());
        assert!(report.accepted.is_empty());
    }

    #[test]
    fn non_positive_entries_are_dropped_silently() {
        let report = validate_weekly_report(
            &draft()
                .with_item("asphalt", 0.0)
                .with_item("drain", -4.0)
                .with_item("ghost", 0.0)
                .with_item("drain", f64::NAN),
            window(),
            &boq(),
            &[],
            OverQuotaPolicy::Reject,
        );
        assert!(report.is_ok());
        assert!(report.warnings.is_empty());
        assert!(report.accepted.is_empty());
    }

    #[test]
    fn duplicate_entries_share_remaining() {
        let report = validate_weekly_report(
            &draft().with_item("drain", 30.0).with_item("drain", 30.0),
            window(),
            &boq(),
            &[],
            OverQuotaPolicy::Reject,
        );
        assert_eq!(kinds(&report), [ViolationKind::ExceedsRemaining]);

        let clamped = validate_weekly_report(
            &draft().with_item("drain", 30.0).with_item("drain", 30.0),
            window(),
            &boq(),
            &[],
            OverQuotaPolicy::Clamp,
        );
        let total: f64 = clamped.accepted.iter().map(|e| e.quantity).sum();
        assert!((total - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn orphans_in_history_do_not_block() {
        let existing = vec![accepted("wr-1", 1, &[("removed", 10.0)])];
        let report = validate_weekly_report(
            &draft().with_item("drain", 10.0),
            window(),
            &boq(),
            &existing,
            OverQuotaPolicy::Reject,
        );
        assert!(report.is_ok());
    }

    #[test]
    fn exact_remaining_is_allowed() {
        let existing = vec![accepted("wr-1", 1, &[("asphalt", 60.0)])];
        let report = validate_weekly_report(
            &draft().with_item("asphalt", 40.0),
            window(),
            &boq(),
            &existing,
            OverQuotaPolicy::Reject,
        );
        assert!(report.is_ok());
    }

    fn decimal_boq(quantity: f64) -> Vec<BoqItem> {
        vec![BoqItem::new("a", quantity, 1.0)]
    }

    #[test]
    fn typed_decimal_remainder_is_accepted() {
        let existing = vec![
            accepted("wr-1", 1, &[("a", 1.1)]),
            accepted("wr-2", 2, &[("a", 1.1)]),
        ];
        let report = validate_weekly_report(
            &draft().with_item("a", 1.1),
            window(),
            &decimal_boq(3.3),
            &existing,
            OverQuotaPolicy::Reject,
        );
        assert!(report.is_ok(), "{:?}", report.messages());

        let mut all = existing;
        all.push(accepted("wr-3", 3, &[("a", report.accepted[0].quantity)]));
        assert!(cumulative_by_item(&all)["a"] <= 3.3);

        let existing = vec![accepted("wr-1", 1, &[("a", 0.01), ("a", 0.02)])];
        let report = validate_weekly_report(
            &draft().with_item("a", 5.07),
            window(),
            &decimal_boq(5.1),
            &existing,
            OverQuotaPolicy::Reject,
        );
        assert!(report.is_ok(), "{:?}", report.messages());
    }

    #[test]
    fn clamped_total_never_rounds_past_contract() {
        for a in 0..99_u32 {
            let contract = 1.0 + f64::from(a) / 7.0;
            for b in 1..99_u32 {
                let prior = f64::from(b) / 100.0 * contract;
                let mut history = vec![accepted("wr-1", 1, &[("a", prior)])];
                let report = validate_weekly_report(
                    &draft().with_item("a", 1e6),
                    window(),
                    &decimal_boq(contract),
                    &history,
                    OverQuotaPolicy::Clamp,
                );
                let taken = report.accepted.first().map_or(0.0, |e| e.quantity);
                history.push(accepted("wr-2", 2, &[("a", taken)]));
                let total = cumulative_by_item(&history)["a"];
                assert!(total <= contract, "contract {contract} prior {prior} total {total}");
            }
        }
    }

    #[test]
    fn over_quota_message_rounds_and_skips_empty_unit() {
        let existing = vec![
            accepted("wr-1", 1, &[("a", 1.1)]),
            accepted("wr-2", 2, &[("a", 1.1)]),
        ];
        let report = validate_weekly_report(
            &draft().with_item("a", 1.5),
            window(),
            &decimal_boq(3.3),
            &existing,
            OverQuotaPolicy::Reject,
        );
        assert_eq!(report.messages(), ["a: quantity 1.5 exceeds remaining 1.1."]);
    }

    #[test]
    fn policy_parses_and_displays() {
        assert_eq!("CLAMP".parse::<OverQuotaPolicy>(), Ok(OverQuotaPolicy::Clamp));
        assert_eq!(OverQuotaPolicy::default().to_string(), "reject");
        assert!("warn".parse::<OverQuotaPolicy>().is_err());
    }
}
