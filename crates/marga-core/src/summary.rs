//! Per-project and portfolio figures.
//!
//! These are the numbers a dashboard or export prints; all of them are
//! derived from project records and a point in time.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::ledger::total_value;
use crate::model::{Project, ScheduleStatus, Staleness};
use crate::progress::{completed_value, physical_progress};
use crate::schedule::{
    DeadlineInfo, days_since_last_report, deadline_info, report_staleness, schedule_status,
    slippage, time_progress,
};

/// Derived state of one project at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub project_id: String,
    pub name: String,
    pub contractor: String,
    pub district: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub length_m: f64,
    pub contract_value: f64,
    pub completed_value: f64,
    pub physical_progress: f64,
    pub time_progress: f64,
    pub slippage: f64,
    pub status: ScheduleStatus,
    pub deadline: DeadlineInfo,
    /// `None` when the project has never been reported on.
    pub days_since_last_report: Option<i64>,
    pub staleness: Staleness,
    pub report_count: usize,
    /// Some report is dated after `now`.
    pub future_dated_reports: bool,
}

impl ProjectSummary {
    #[must_use]
    pub fn compute(project: &Project, now: DateTime<Utc>) -> Self {
        let boq = &project.boq;
        let reports = &project.weekly_reports;

        let physical = physical_progress(boq, reports);
        let time = time_progress(project.start_date, project.end_date, now);
        let days_since = days_since_last_report(reports, now);

        Self {
            project_id: project.id.clone(),
            name: project.name.clone(),
            contractor: project.contractor.clone(),
            district: project.district.clone(),
            start_date: project.start_date,
            end_date: project.end_date,
            length_m: project.length_m,
            contract_value: total_value(boq),
            completed_value: completed_value(boq, reports),
            physical_progress: physical,
            time_progress: time,
            slippage: slippage(physical, time),
            status: schedule_status(physical, time),
            deadline: deadline_info(project.start_date, project.end_date, now),
            days_since_last_report: days_since,
            staleness: report_staleness(days_since, physical),
            report_count: reports.len(),
            future_dated_reports: days_since.is_some_and(|days| days < 0),
        }
    }
}

/// Physical-progress distribution bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ProgressBucket {
    #[serde(rename = "0-25")]
    Low,
    #[serde(rename = "25-50")]
    Mid,
    #[serde(rename = "50-75")]
    High,
    #[serde(rename = "75-100")]
    Done,
}

impl ProgressBucket {
    pub const ALL: [Self; 4] = [Self::Low, Self::Mid, Self::High, Self::Done];

    /// `[0, 25)`, `[25, 50)`, `[50, 75)`, and `[75, 100]`.
    #[must_use]
    pub fn of(physical_progress: f64) -> Self {
        if physical_progress < 25.0 {
            Self::Low
        } else if physical_progress < 50.0 {
            Self::Mid
        } else if physical_progress < 75.0 {
            Self::High
        } else {
            Self::Done
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "0-25%",
            Self::Mid => "25-50%",
            Self::High => "50-75%",
            Self::Done => "75-100%",
        }
    }
}

/// Roll-up over every project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub project_count: usize,
    pub total_contract_value: f64,
    pub total_completed_value: f64,
    pub total_length_m: f64,
    /// Mean physical progress; `0` for an empty portfolio.
    pub average_progress: f64,
    /// Projects that are `delayed` or `at-risk`.
    pub behind_count: usize,
    pub by_status: BTreeMap<ScheduleStatus, usize>,
    pub by_staleness: BTreeMap<Staleness, usize>,
    pub by_bucket: BTreeMap<ProgressBucket, usize>,
    pub projects: Vec<ProjectSummary>,
}

impl PortfolioSummary {
    #[must_use]
    pub fn compute(projects: &[Project], now: DateTime<Utc>) -> Self {
        let summaries: Vec<ProjectSummary> = projects
            .iter()
            .map(|project| ProjectSummary::compute(project, now))
            .collect();
        Self::from_summaries(summaries)
    }

    /// Roll up already computed project summaries.
    #[must_use]
    pub fn from_summaries(projects: Vec<ProjectSummary>) -> Self {
        let mut by_status: BTreeMap<ScheduleStatus, usize> =
            ScheduleStatus::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_staleness: BTreeMap<Staleness, usize> =
            Staleness::ALL.iter().map(|s| (*s, 0)).collect();
        let mut by_bucket: BTreeMap<ProgressBucket, usize> =
            ProgressBucket::ALL.iter().map(|b| (*b, 0)).collect();

        let mut total_contract_value = 0.0;
        let mut total_completed_value = 0.0;
        let mut total_length_m = 0.0;
        let mut progress_sum = 0.0;

        for summary in &projects {
            total_contract_value += summary.contract_value;
            total_completed_value += summary.completed_value;
            total_length_m += summary.length_m;
            progress_sum += summary.physical_progress;
            *by_status.entry(summary.status).or_default() += 1;
            *by_staleness.entry(summary.staleness).or_default() += 1;
            *by_bucket
                .entry(ProgressBucket::of(summary.physical_progress))
                .or_default() += 1;
        }

        #[allow(clippy::cast_precision_loss)]
        let average_progress = if projects.is_empty() {
            0.0
        } else {
            progress_sum / projects.len() as f64
        };
        let behind_count = projects.iter().filter(|s| s.status.is_behind()).count();

        Self {
            project_count: projects.len(),
            total_contract_value,
            total_completed_value,
            total_length_m,
            average_progress,
            behind_count,
            by_status,
            by_staleness,
            by_bucket,
            projects,
        }
    }
}
