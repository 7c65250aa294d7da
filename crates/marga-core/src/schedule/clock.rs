//! Schedule clock: elapsed contract time, deadlines, and report staleness.
//!
//! Contract dates are calendar dates; they are anchored at midnight UTC when
//! compared against "now". Day counts use exact integer arithmetic on
//! milliseconds, so `ceil`/`floor` behave the same for negative spans.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::model::{DeadlineStatus, Staleness, WeeklyReport};

const DAY_MS: i64 = 86_400_000;

/// Days left at or below which an active contract is "ending soon".
pub const ENDING_SOON_DAYS: i64 = 14;
/// Days without a report after which a project is stale.
pub const STALE_AFTER_DAYS: i64 = 7;
/// Days without a report after which a project is critically stale.
pub const CRITICAL_AFTER_DAYS: i64 = 14;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date of [`Clock::now`] in UTC.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// Freeze at midnight UTC of `date`.
    #[must_use]
    pub fn at_date(date: NaiveDate) -> Self {
        Self(start_of_day(date))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Midnight UTC at the start of `date`.
#[must_use]
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn span_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_milliseconds()
}

fn ceil_days(ms: i64) -> i64 {
    ms.div_euclid(DAY_MS) + i64::from(ms.rem_euclid(DAY_MS) != 0)
}

fn floor_days(ms: i64) -> i64 {
    ms.div_euclid(DAY_MS)
}

/// Whole days between two calendar dates, rounded up.
#[must_use]
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    ceil_days(span_ms(start_of_day(start), start_of_day(end)))
}

/// Elapsed share of the contract window in percent, `0..=100`.
///
/// - `now <= start` gives `0`.
/// - `now >= end` gives `100`.
/// - A degenerate window (`end <= start`) with `now` past its start gives
///   `100`: no time is left.
/// - Otherwise linear interpolation.
#[must_use]
pub fn time_progress(start: NaiveDate, end: NaiveDate, now: DateTime<Utc>) -> f64 {
    let start = start_of_day(start);
    let end = start_of_day(end);

    if now <= start {
        return 0.0;
    }
    if now >= end || end <= start {
        return 100.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let fraction = span_ms(start, now) as f64 / span_ms(start, end) as f64;
    (fraction * 100.0).clamp(0.0, 100.0)
}

/// Deadline summary for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlineInfo {
    /// Days until the start (upcoming) or until the end (otherwise).
    /// Negative when overdue.
    pub days_remaining: i64,
    pub status: DeadlineStatus,
    pub label: String,
}

/// Classify "now" against the contract window.
///
/// - Before the start: `upcoming`, counting days until the start.
/// - Otherwise `days_left = ceil((end - now) / 1 day)`:
///   negative is `overdue`, `0..=14` is `ending-soon`, more is `active`.
#[must_use]
pub fn deadline_info(start: NaiveDate, end: NaiveDate, now: DateTime<Utc>) -> DeadlineInfo {
    let start = start_of_day(start);
    if now < start {
        let days = ceil_days(span_ms(now, start));
        return DeadlineInfo {
            days_remaining: days,
            status: DeadlineStatus::Upcoming,
            label: format!("Starts in {days}d"),
        };
    }

    let days_left = ceil_days(span_ms(now, start_of_day(end)));
    let (status, label) = if days_left < 0 {
        (DeadlineStatus::Overdue, format!("{}d overdue", -days_left))
    } else if days_left <= ENDING_SOON_DAYS {
        (DeadlineStatus::EndingSoon, format!("{days_left}d left"))
    } else {
        (DeadlineStatus::Active, format!("{days_left}d left"))
    };

    DeadlineInfo {
        days_remaining: days_left,
        status,
        label,
    }
}

/// Whole days since the most recent report, or `None` when there are no
/// reports at all (read it as "infinitely long ago").
///
/// Each report counts at its `created_at`, falling back to midnight at the
/// end of its period. The result is not clamped: a negative value means a
/// report is dated in the future, which is logged and left visible.
#[must_use]
pub fn days_since_last_report(reports: &[WeeklyReport], now: DateTime<Utc>) -> Option<i64> {
    let latest = reports.iter().map(WeeklyReport::reported_at).max()?;
    let days = floor_days(span_ms(latest, now));
    if days < 0 {
        warn!(%latest, %now, days, "latest weekly report is dated in the future");
    }
    Some(days)
}

/// Reporting freshness.
///
/// Completed projects (`physical_progress >= 100`) are always fresh. Otherwise
/// 14+ days is critical and 7+ days is stale. No reports at all counts as
/// infinitely stale. Negative day counts (future-dated reports) are fresh.
#[must_use]
pub fn report_staleness(days_since: Option<i64>, physical_progress: f64) -> Staleness {
    if physical_progress >= 100.0 {
        return Staleness::Fresh;
    }
    match days_since {
        None => Staleness::Critical,
        Some(days) if days >= CRITICAL_AFTER_DAYS => Staleness::Critical,
        Some(days) if days >= STALE_AFTER_DAYS => Staleness::Stale,
        Some(_) => Staleness::Fresh,
    }
}
