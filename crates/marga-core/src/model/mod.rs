//! Canonical data model: projects, BoQ items, and weekly reports.

pub mod boq;
pub mod ids;
pub mod numeric;
pub mod project;
pub mod report;
pub mod status;

pub use boq::BoqItem;
pub use project::{ContractWindow, MaintenanceType, Project, RoadHierarchy, WorkType};
pub use report::{ItemProgress, ReportDraft, WeeklyReport};
pub use status::{DeadlineStatus, ParseEnumError, ScheduleStatus, Staleness};
