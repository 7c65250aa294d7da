//! Orchestration: the validator in front of a [`ProjectStore`].
//!
//! [`Tracker`] owns a store and a clock and is the only place that mutates
//! project records. Every read recomputes derived figures from the stored
//! BoQ and reports.

use std::num::NonZeroU32;
use tracing::{info, warn};

use crate::config::ProjectConfig;
use crate::curve::{DEFAULT_TICK, SeriesPoint, s_curve_series};
use crate::error::ErrorCode;
use crate::model::ids::{BOQ_PREFIX, REPORT_PREFIX, generate_id};
use crate::model::{BoqItem, Project, ReportDraft, WeeklyReport};
use crate::progress::{ItemCompletion, ReportProgress, item_completion, report_ledger};
use crate::schedule::Clock;
use crate::store::{ProjectStore, StoreError};
use crate::summary::{PortfolioSummary, ProjectSummary};
use crate::validate::{OverQuotaPolicy, ValidationReport, validate_weekly_report};

/// Errors raised by [`Tracker`] operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("BoQ item not found: {0}")]
    BoqItemNotFound(String),

    #[error("BoQ item already exists: {0}")]
    BoqItemExists(String),

    #[error("weekly report not found: {0}")]
    ReportNotFound(String),

    #[error("weekly report rejected: {}", .0.messages().join(" "))]
    Rejected(Box<ValidationReport>),

    #[error(transparent)]
    Store(StoreError),
}

impl TrackerError {
    /// Machine-readable code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ProjectNotFound(_) => ErrorCode::ProjectNotFound,
            Self::BoqItemNotFound(_) => ErrorCode::BoqItemNotFound,
            Self::BoqItemExists(_) => ErrorCode::BoqItemExists,
            Self::ReportNotFound(_) => ErrorCode::ReportNotFound,
            Self::Rejected(_) => ErrorCode::ReportRejected,
            Self::Store(err) => err.code(),
        }
    }

    /// The validation outcome, for a rejected report.
    #[must_use]
    pub fn validation(&self) -> Option<&ValidationReport> {
        match self {
            Self::Rejected(report) => Some(report.as_ref()),
            _ => None,
        }
    }
}

impl From<StoreError> for TrackerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::ProjectNotFound(id),
            other => Self::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Project tracking service over an explicit store and clock.
#[derive(Debug)]
pub struct Tracker<S, C> {
    store: S,
    clock: C,
    policy: OverQuotaPolicy,
    tick: NonZeroU32,
}

impl<S: ProjectStore, C: Clock> Tracker<S, C> {
    /// A tracker with the default policy (`reject`) and weekly curve ticks.
    #[must_use]
    pub const fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            policy: OverQuotaPolicy::Reject,
            tick: DEFAULT_TICK,
        }
    }

    /// Apply the workspace config.
    #[must_use]
    pub fn with_config(mut self, config: &ProjectConfig) -> Self {
        self.policy = config.reports.over_quota;
        self.tick = config.curve.tick();
        self
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: OverQuotaPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn policy(&self) -> OverQuotaPolicy {
        self.policy
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// Persist a new project, stamping `created_at`/`updated_at`.
    ///
    /// # Errors
    ///
    /// Fails if the id is taken or the store fails.
    pub fn create_project(&self, mut project: Project) -> Result<Project> {
        let now = self.clock.now();
        project.created_at.get_or_insert(now);
        project.updated_at = Some(now);
        self.store.create(&project)?;
        info!(project_id = %project.id, name = %project.name, "project created");
        Ok(project)
    }

    /// # Errors
    ///
    /// [`TrackerError::ProjectNotFound`] for an unknown id.
    pub fn project(&self, project_id: &str) -> Result<Project> {
        Ok(self.store.get(project_id)?)
    }

    /// # Errors
    ///
    /// Fails if the store cannot be read.
    pub fn projects(&self) -> Result<Vec<Project>> {
        Ok(self.store.list()?)
    }

    /// # Errors
    ///
    /// [`TrackerError::ProjectNotFound`] for an unknown id.
    pub fn remove_project(&self, project_id: &str) -> Result<()> {
        self.store.delete(project_id)?;
        info!(project_id, "project deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // BoQ
    // -----------------------------------------------------------------------

    /// Append a BoQ line. An empty id is replaced with a generated one.
    ///
    /// # Errors
    ///
    /// [`TrackerError::BoqItemExists`] if the id is already in this BoQ.
    pub fn add_boq_item(&self, project_id: &str, mut item: BoqItem) -> Result<BoqItem> {
        let mut project = self.store.get(project_id)?;
        if item.id.is_empty() {
            let seed = format!("{project_id}:{}:{}", item.item_number, item.description);
            item.id = generate_id(BOQ_PREFIX, &seed);
        }
        if project.boq_item(&item.id).is_some() {
            return Err(TrackerError::BoqItemExists(item.id));
        }

        project.boq.push(item.clone());
        self.save(&mut project)?;
        info!(project_id, boq_item_id = %item.id, "BoQ item added");
        Ok(item)
    }

    /// Remove a BoQ line. Reports that referenced it keep their entries,
    /// which the aggregator then ignores.
    ///
    /// # Errors
    ///
    /// [`TrackerError::BoqItemNotFound`] if the item is not in this BoQ.
    pub fn remove_boq_item(&self, project_id: &str, item_id: &str) -> Result<BoqItem> {
        let mut project = self.store.get(project_id)?;
        let index = project
            .boq
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| TrackerError::BoqItemNotFound(item_id.to_string()))?;
        let removed = project.boq.remove(index);

        let referencing = project
            .weekly_reports
            .iter()
            .filter(|report| report.item_progress.iter().any(|e| e.boq_item_id == item_id))
            .count();
        if referencing > 0 {
            warn!(
                project_id,
                boq_item_id = item_id,
                reports = referencing,
                "removed BoQ item is still referenced by reports"
            );
        }

        self.save(&mut project)?;
        info!(project_id, boq_item_id = item_id, "BoQ item removed");
        Ok(removed)
    }

    /// Per-item completion for a project's BoQ.
    ///
    /// # Errors
    ///
    /// [`TrackerError::ProjectNotFound`] for an unknown id.
    pub fn items(&self, project_id: &str) -> Result<Vec<ItemCompletion>> {
        let project = self.store.get(project_id)?;
        Ok(item_completion(&project.boq, &project.weekly_reports))
    }

    // -----------------------------------------------------------------------
    // Weekly reports
    // -----------------------------------------------------------------------

    /// Validate a draft and, if it passes, store it as a new report.
    ///
    /// Under the `clamp` policy the stored quantities are the clamped ones
    /// and the store is written even when warnings were raised.
    ///
    /// # Errors
    ///
    /// [`TrackerError::Rejected`] with every violation when the draft fails
    /// validation; the store is left untouched.
    pub fn submit_report(&self, project_id: &str, draft: &ReportDraft) -> Result<WeeklyReport> {
        let mut project = self.store.get(project_id)?;
        let outcome = validate_weekly_report(
            draft,
            project.window(),
            &project.boq,
            &project.weekly_reports,
            self.policy,
        );

        let (Some(week_number), Some(start_date), Some(end_date)) =
            (draft.week_number, draft.start_date, draft.end_date)
        else {
            return Err(TrackerError::Rejected(Box::new(outcome)));
        };
        if !outcome.is_ok() {
            info!(
                project_id,
                week_number,
                violations = outcome.errors.len(),
                "weekly report rejected"
            );
            return Err(TrackerError::Rejected(Box::new(outcome)));
        }
        for warning in &outcome.warnings {
            warn!(project_id, week_number, "{}", warning.message);
        }

        let report = WeeklyReport {
            id: generate_id(REPORT_PREFIX, &format!("{project_id}:{week_number}")),
            week_number,
            start_date,
            end_date,
            work_description: draft.work_description.clone(),
            item_progress: outcome.accepted,
            created_at: Some(self.clock.now()),
        };
        project.weekly_reports.push(report.clone());
        self.save(&mut project)?;

        info!(
            project_id,
            report_id = %report.id,
            week_number,
            entries = report.item_progress.len(),
            "weekly report accepted"
        );
        Ok(report)
    }

    /// Delete a report. Later reports' figures change on the next read.
    ///
    /// # Errors
    ///
    /// [`TrackerError::ReportNotFound`] if the report is not in this project.
    pub fn delete_report(&self, project_id: &str, report_id: &str) -> Result<WeeklyReport> {
        let mut project = self.store.get(project_id)?;
        let index = project
            .weekly_reports
            .iter()
            .position(|report| report.id == report_id)
            .ok_or_else(|| TrackerError::ReportNotFound(report_id.to_string()))?;
        let removed = project.weekly_reports.remove(index);

        self.save(&mut project)?;
        info!(project_id, report_id, week_number = removed.week_number, "weekly report deleted");
        Ok(removed)
    }

    /// Weekly and cumulative progress per report, in chronological order.
    ///
    /// # Errors
    ///
    /// [`TrackerError::ProjectNotFound`] for an unknown id.
    pub fn ledger(&self, project_id: &str) -> Result<Vec<ReportProgress>> {
        let project = self.store.get(project_id)?;
        Ok(report_ledger(&project.boq, &project.weekly_reports))
    }

    // -----------------------------------------------------------------------
    // Derived views
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// [`TrackerError::ProjectNotFound`] for an unknown id.
    pub fn summary(&self, project_id: &str) -> Result<ProjectSummary> {
        let project = self.store.get(project_id)?;
        Ok(ProjectSummary::compute(&project, self.clock.now()))
    }

    /// # Errors
    ///
    /// Fails if the store cannot be read.
    pub fn portfolio(&self) -> Result<PortfolioSummary> {
        let projects = self.store.list()?;
        Ok(PortfolioSummary::compute(&projects, self.clock.now()))
    }

    /// Planned-vs-actual series; `tick` defaults to the configured interval.
    ///
    /// # Errors
    ///
    /// [`TrackerError::ProjectNotFound`] for an unknown id.
    pub fn curve(&self, project_id: &str, tick: Option<NonZeroU32>) -> Result<Vec<SeriesPoint>> {
        let project = self.store.get(project_id)?;
        Ok(s_curve_series(
            &project.boq,
            &project.weekly_reports,
            project.start_date,
            project.end_date,
            tick.unwrap_or(self.tick),
            self.clock.today(),
        ))
    }

    fn save(&self, project: &mut Project) -> Result<()> {
        project.updated_at = Some(self.clock.now());
        self.store.update(project)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScheduleStatus;
    use crate::schedule::FixedClock;
    use crate::store::MemoryStore;
    use crate::validate::ViolationKind;
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).expect("valid date")
    }

    fn tracker() -> Tracker<MemoryStore, FixedClock> {
        Tracker::new(MemoryStore::new(), FixedClock::at_date(date(3, 1)))
    }

    fn seeded(tracker: &Tracker<MemoryStore, FixedClock>) -> (String, String) {
        let project = tracker
            .create_project(Project::new("Jalan Cempaka", date(1, 1), date(6, 30)))
            .expect("create project");
        let item = tracker
            .add_boq_item(&project.id, BoqItem::new("", 100.0, 50.0))
            .expect("add item");
        (project.id, item.id)
    }

    fn week(n: u32) -> ReportDraft {
        let start = date(1, 1) + chrono::Duration::weeks(i64::from(n) - 1);
        ReportDraft::new(n, start, start + chrono::Duration::days(6))
    }

    #[test]
    fn create_project_stamps_times() {
        let tracker = tracker();
        let (project_id, _) = seeded(&tracker);
        let project = tracker.project(&project_id).expect("get");
        assert!(project.created_at.is_some());
        assert!(project.updated_at.is_some());
    }

    #[test]
    fn add_boq_item_generates_id_and_rejects_duplicates() {
        let tracker = tracker();
        let (project_id, item_id) = seeded(&tracker);
        assert!(item_id.starts_with("boq-"));

        let err = tracker
            .add_boq_item(&project_id, BoqItem::new(item_id.clone(), 1.0, 1.0))
            .expect_err("duplicate id");
        assert_eq!(err.code(), ErrorCode::BoqItemExists);
    }

    #[test]
    fn accepted_report_is_stored_with_id_and_time() {
        let tracker = tracker();
        let (project_id, item_id) = seeded(&tracker);
        let report = tracker
            .submit_report(&project_id, &week(1).with_item(&item_id, 25.0))
            .expect("accepted");
        assert!(report.id.starts_with("wr-"));
        assert!(report.created_at.is_some());

        let summary = tracker.summary(&project_id).expect("summary");
        assert!((summary.physical_progress - 25.0).abs() < 1e-9);
        assert_eq!(summary.report_count, 1);
    }

    #[test]
    fn rejected_report_leaves_store_untouched() {
        let tracker = tracker();
        let (project_id, item_id) = seeded(&tracker);
        let before = tracker.project(&project_id).expect("get");

        let draft = ReportDraft::new(26, date(6, 25), date(7, 1)).with_item(&item_id, 500.0);
        let err = tracker
            .submit_report(&project_id, &draft)
            .expect_err("must reject");
        assert_eq!(err.code(), ErrorCode::ReportRejected);
        let kinds: Vec<ViolationKind> = err
            .validation()
            .expect("validation report")
            .errors
            .iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            [ViolationKind::EndsAfterContract, ViolationKind::ExceedsRemaining]
        );

        assert_eq!(tracker.project(&project_id).expect("get"), before);
    }

    #[test]
    fn missing_header_is_rejected() {
        let tracker = tracker();
        let (project_id, _) = seeded(&tracker);
        let err = tracker
            .submit_report(&project_id, &ReportDraft::default())
            .expect_err("must reject");
        assert!(matches!(err, TrackerError::Rejected(_)));
    }

    #[test]
    fn clamp_policy_stores_clamped_quantity() {
        let tracker = tracker().with_policy(OverQuotaPolicy::Clamp);
        let (project_id, item_id) = seeded(&tracker);
        tracker
            .submit_report(&project_id, &week(1).with_item(&item_id, 70.0))
            .expect("first");
        let second = tracker
            .submit_report(&project_id, &week(2).with_item(&item_id, 70.0))
            .expect("clamped");
        assert!((second.item_progress[0].quantity - 30.0).abs() < f64::EPSILON);

        let summary = tracker.summary(&project_id).expect("summary");
        assert!((summary.physical_progress - 100.0).abs() < 1e-9);
        assert_eq!(summary.status, ScheduleStatus::OnTrack);
    }

    #[test]
    fn deleting_report_recomputes_later_figures() {
        let tracker = tracker();
        let (project_id, item_id) = seeded(&tracker);
        let first = tracker
            .submit_report(&project_id, &week(1).with_item(&item_id, 40.0))
            .expect("w1");
        tracker
            .submit_report(&project_id, &week(2).with_item(&item_id, 10.0))
            .expect("w2");

        tracker
            .delete_report(&project_id, &first.id)
            .expect("delete");
        let ledger = tracker.ledger(&project_id).expect("ledger");
        assert_eq!(ledger.len(), 1);
        assert!((ledger[0].cumulative_progress - 10.0).abs() < 1e-9);

        let err = tracker
            .delete_report(&project_id, &first.id)
            .expect_err("already gone");
        assert_eq!(err.code(), ErrorCode::ReportNotFound);
    }

    #[test]
    fn removing_boq_item_orphans_entries() {
        let tracker = tracker();
        let (project_id, item_id) = seeded(&tracker);
        let other = tracker
            .add_boq_item(&project_id, BoqItem::new("", 100.0, 50.0))
            .expect("second item");
        tracker
            .submit_report(
                &project_id,
                &week(1).with_item(&item_id, 50.0).with_item(&other.id, 50.0),
            )
            .expect("accepted");

        tracker
            .remove_boq_item(&project_id, &item_id)
            .expect("remove");
        let summary = tracker.summary(&project_id).expect("summary");
        assert!((summary.physical_progress - 50.0).abs() < 1e-9);
        assert_eq!(
            tracker
                .project(&project_id)
                .expect("get")
                .weekly_reports[0]
                .item_progress
                .len(),
            2
        );
    }

    #[test]
    fn unknown_project_maps_to_not_found() {
        let tracker = tracker();
        let err = tracker.summary("prj-missing").expect_err("missing");
        assert_eq!(err.code(), ErrorCode::ProjectNotFound);
    }

    #[test]
    fn curve_uses_clock_for_actuals() {
        let tracker = tracker();
        let (project_id, item_id) = seeded(&tracker);
        tracker
            .submit_report(&project_id, &week(1).with_item(&item_id, 10.0))
            .expect("w1");
        let series = tracker.curve(&project_id, None).expect("curve");
        assert_eq!(series.first().map(|p| p.day), Some(0));
        assert!(series.iter().any(|p| p.actual_value.is_none()));
        assert_eq!(series[1].actual_value, Some(500.0));
    }

    #[test]
    fn every_write_moves_the_revision() {
        let tracker = tracker();
        let (project_id, item_id) = seeded(&tracker);
        let before = tracker.project(&project_id).expect("project").revision;
        tracker
            .submit_report(&project_id, &week(1).with_item(&item_id, 10.0))
            .expect("w1");
        assert_eq!(tracker.project(&project_id).expect("project").revision, before + 1);
    }

    #[test]
    fn lost_update_surfaces_as_project_changed() {
        let err = TrackerError::from(StoreError::Conflict {
            id: "prj-1".into(),
            expected: 4,
        });
        assert_eq!(err.code(), ErrorCode::ProjectChanged);
        assert!(err.to_string().contains("revision 4"));
    }
}
