//! Schedule classifier: physical progress against elapsed time.

use crate::model::ScheduleStatus;

/// Slippage strictly below this is `delayed`.
pub const DELAYED_BELOW: f64 = -15.0;
/// Slippage strictly below this (and not delayed) is `at-risk`.
pub const AT_RISK_BELOW: f64 = -5.0;
/// Slippage strictly above this is `ahead`.
pub const AHEAD_ABOVE: f64 = 5.0;

/// Physical progress minus time progress, in percentage points.
#[must_use]
pub fn slippage(physical_progress: f64, time_progress: f64) -> f64 {
    physical_progress - time_progress
}

/// Classify schedule health.
///
/// A completed contract (`physical_progress >= 100`) is always `on-track`.
/// Otherwise, with `s = physical - time`:
///
/// | slippage           | status     |
/// |--------------------|------------|
/// | `s < -15`          | `delayed`  |
/// | `-15 <= s < -5`    | `at-risk`  |
/// | `s > 5`            | `ahead`    |
/// | otherwise          | `on-track` |
#[must_use]
pub fn schedule_status(physical_progress: f64, time_progress: f64) -> ScheduleStatus {
    if physical_progress >= 100.0 {
        return ScheduleStatus::OnTrack;
    }

    let s = slippage(physical_progress, time_progress);
    if s < DELAYED_BELOW {
        ScheduleStatus::Delayed
    } else if s < AT_RISK_BELOW {
        ScheduleStatus::AtRisk
    } else if s > AHEAD_ABOVE {
        ScheduleStatus::Ahead
    } else {
        ScheduleStatus::OnTrack
    }
}
