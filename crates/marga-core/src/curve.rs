//! Planned-progress S-curve.
//!
//! The baseline disbursement plan is a logistic curve over the contract
//! window: slow mobilisation, fast middle, tapering finish. The curve is
//! normalised to pass exactly through `(0, 0)` and `(1, 1)`, and the two
//! endpoints are pinned explicitly rather than left to floating-point.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::num::NonZeroU32;

use crate::ledger::total_value;
use crate::model::{BoqItem, WeeklyReport};
use crate::progress::{CumulativeMap, accumulate, completed_value_from};
use crate::schedule::clock::days_between;

/// Logistic steepness `k`.
pub const STEEPNESS: f64 = 10.0;

/// Default sampling interval for the curve.
pub const DEFAULT_TICK_DAYS: u32 = 7;

/// [`DEFAULT_TICK_DAYS`] as a sampling interval.
pub const DEFAULT_TICK: NonZeroU32 = NonZeroU32::MIN.saturating_add(DEFAULT_TICK_DAYS - 1);

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-STEEPNESS * (x - 0.5)).exp())
}

/// Normalised planned fraction `g(t)` for elapsed-time fraction `t`.
///
/// `g(t) = (f(t) - f(0)) / (f(1) - f(0))` with `f` the logistic function;
/// `t <= 0` (or NaN) gives exactly `0`, `t >= 1` gives exactly `1`.
#[must_use]
pub fn s_curve_fraction(t: f64) -> f64 {
    if t.is_nan() || t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let f0 = logistic(0.0);
    let f1 = logistic(1.0);
    (logistic(t) - f0) / (f1 - f0)
}

/// Planned cumulative value at time fraction `t`.
#[must_use]
pub fn planned_value(total_contract_value: f64, t: f64) -> f64 {
    s_curve_fraction(t) * total_contract_value
}

/// One sample of the planned curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvePoint {
    /// Days since the contract start.
    pub day: i64,
    pub date: NaiveDate,
    /// Elapsed-time fraction, `0..=1`.
    pub t: f64,
    pub planned_value: f64,
}

/// Sample the planned curve every `tick` days across the contract window.
///
/// Samples fall on day `0, tick, 2*tick, ...`; the end date is always
/// included as the final sample with `t = 1`. A degenerate window
/// (`end <= start`) yields a single fully-elapsed sample.
#[must_use]
pub fn planned_progress_curve(
    total_contract_value: f64,
    start: NaiveDate,
    end: NaiveDate,
    tick: NonZeroU32,
) -> Vec<CurvePoint> {
    let total_days = days_between(start, end);
    if total_days <= 0 {
        return vec![CurvePoint {
            day: 0,
            date: end,
            t: 1.0,
            planned_value: total_contract_value,
        }];
    }

    let step = i64::from(tick.get());
    let mut points = Vec::new();
    let mut day = 0;
    while day < total_days {
        points.push(sample(total_contract_value, start, day, total_days));
        day += step;
    }
    points.push(sample(total_contract_value, start, total_days, total_days));
    points
}

fn sample(total_contract_value: f64, start: NaiveDate, day: i64, total_days: i64) -> CurvePoint {
    #[allow(clippy::cast_precision_loss)]
    let t = if day >= total_days {
        1.0
    } else {
        day as f64 / total_days as f64
    };
    CurvePoint {
        day,
        date: start + Duration::days(day),
        t,
        planned_value: planned_value(total_contract_value, t),
    }
}

/// Planned and actual value at one sample date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub day: i64,
    pub date: NaiveDate,
    pub t: f64,
    pub planned_value: f64,
    /// Completed value of reports whose period ended on or before `date`;
    /// `None` for sample dates after `today`.
    pub actual_value: Option<f64>,
}

/// Planned-vs-actual series for charting.
///
/// Actual values reuse the aggregator's clamping, so they never exceed the
/// contract value and never decrease from one sample to the next.
#[must_use]
pub fn s_curve_series(
    boq: &[BoqItem],
    reports: &[WeeklyReport],
    start: NaiveDate,
    end: NaiveDate,
    tick: NonZeroU32,
    today: NaiveDate,
) -> Vec<SeriesPoint> {
    let contract_value = total_value(boq);
    let mut by_end: Vec<&WeeklyReport> = reports.iter().collect();
    by_end.sort_by_key(|report| report.end_date);

    let mut cumulative = CumulativeMap::new();
    let mut pending = by_end.into_iter().peekable();

    planned_progress_curve(contract_value, start, end, tick)
        .into_iter()
        .map(|point| {
            while let Some(report) = pending.next_if(|report| report.end_date <= point.date) {
                accumulate(&mut cumulative, report);
            }
            let actual_value =
                (point.date <= today).then(|| completed_value_from(boq, &cumulative));
            SeriesPoint {
                day: point.day,
                date: point.date,
                t: point.t,
                planned_value: point.planned_value,
                actual_value,
            }
        })
        .collect()
}
