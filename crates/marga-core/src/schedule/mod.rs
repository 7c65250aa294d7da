//! Schedule clock and schedule-health classification.

pub mod classify;
pub mod clock;

pub use classify::{schedule_status, slippage};
pub use clock::{
    Clock, DeadlineInfo, FixedClock, SystemClock, days_since_last_report, deadline_info,
    report_staleness, time_progress,
};
