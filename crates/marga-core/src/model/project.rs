use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::boq::BoqItem;
use super::ids::{PROJECT_PREFIX, generate_id};
use super::numeric::lenient_f64;
use super::report::WeeklyReport;
use super::status::{ParseEnumError, normalize};

/// Pavement type of the contracted works.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkType {
    RigidPavement,
    FlexiblePavement,
    Combination,
    Other,
}

impl WorkType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::RigidPavement => "rigid-pavement",
            Self::FlexiblePavement => "flexible-pavement",
            Self::Combination => "combination",
            Self::Other => "other",
        }
    }
}

/// Administrative road class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoadHierarchy {
    #[serde(rename = "JAS")]
    Jas,
    #[serde(rename = "JKS")]
    Jks,
    #[serde(rename = "JLS")]
    Jls,
    #[serde(rename = "Jling-S")]
    JlingS,
    #[serde(rename = "J-ling Kota")]
    JlingKota,
}

impl RoadHierarchy {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Jas => "JAS",
            Self::Jks => "JKS",
            Self::Jls => "JLS",
            Self::JlingS => "Jling-S",
            Self::JlingKota => "J-ling Kota",
        }
    }
}

/// Kind of maintenance intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MaintenanceType {
    Reconstruction,
    Rehabilitation,
    PeriodicRehabilitation,
    RoutineMaintenance,
}

impl MaintenanceType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Reconstruction => "reconstruction",
            Self::Rehabilitation => "rehabilitation",
            Self::PeriodicRehabilitation => "periodic-rehabilitation",
            Self::RoutineMaintenance => "routine-maintenance",
        }
    }
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for RoadHierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for MaintenanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "rigid-pavement" | "rigid" => Ok(Self::RigidPavement),
            "flexible-pavement" | "flexible" => Ok(Self::FlexiblePavement),
            "combination" => Ok(Self::Combination),
            "other" => Ok(Self::Other),
            _ => Err(ParseEnumError {
                expected: "work type",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for RoadHierarchy {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "jas" => Ok(Self::Jas),
            "jks" => Ok(Self::Jks),
            "jls" => Ok(Self::Jls),
            "jling-s" => Ok(Self::JlingS),
            "j-ling kota" | "jling-kota" => Ok(Self::JlingKota),
            _ => Err(ParseEnumError {
                expected: "road hierarchy",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for MaintenanceType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "reconstruction" => Ok(Self::Reconstruction),
            "rehabilitation" => Ok(Self::Rehabilitation),
            "periodic-rehabilitation" => Ok(Self::PeriodicRehabilitation),
            "routine-maintenance" => Ok(Self::RoutineMaintenance),
            _ => Err(ParseEnumError {
                expected: "maintenance type",
                got: s.to_string(),
            }),
        }
    }
}

/// The contract's time window, both ends inclusive calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ContractWindow {
    #[must_use]
    pub const fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// `true` when the window is empty or inverted.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.end_date <= self.start_date
    }
}

/// Aggregate root: one contract, its BoQ, and its weekly reports.
///
/// Progress and schedule state are never stored here; they are always
/// derived from `boq`, `weekly_reports`, and a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub contractor: String,
    #[serde(default)]
    pub supervisor: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub sub_district: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_type: Option<WorkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road_hierarchy: Option<RoadHierarchy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_type: Option<MaintenanceType>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Road length in metres.
    #[serde(default, rename = "length", deserialize_with = "lenient_f64")]
    pub length_m: f64,
    /// Average carriageway width in metres.
    #[serde(default, rename = "averageWidth", deserialize_with = "lenient_f64")]
    pub average_width_m: f64,
    #[serde(default)]
    pub boq: Vec<BoqItem>,
    #[serde(default)]
    pub weekly_reports: Vec<WeeklyReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Bumped by the store on every update; a write carrying an older value
    /// is refused.
    #[serde(default)]
    pub revision: u32,
}

impl Project {
    /// Create an empty project with a freshly generated id.
    #[must_use]
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let name = name.into();
        Self {
            id: generate_id(PROJECT_PREFIX, &name),
            name,
            contractor: String::new(),
            supervisor: String::new(),
            district: String::new(),
            sub_district: String::new(),
            work_type: None,
            road_hierarchy: None,
            maintenance_type: None,
            start_date,
            end_date,
            length_m: 0.0,
            average_width_m: 0.0,
            boq: Vec::new(),
            weekly_reports: Vec::new(),
            created_at: None,
            updated_at: None,
            revision: 0,
        }
    }

    #[must_use]
    pub const fn window(&self) -> ContractWindow {
        ContractWindow::new(self.start_date, self.end_date)
    }

    #[must_use]
    pub fn boq_item(&self, id: &str) -> Option<&BoqItem> {
        self.boq.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn report(&self, id: &str) -> Option<&WeeklyReport> {
        self.weekly_reports.iter().find(|report| report.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn metadata_enums_use_original_labels() {
        assert_eq!(
            serde_json::to_string(&RoadHierarchy::JlingKota).unwrap(),
            "\"J-ling Kota\""
        );
        assert_eq!(
            serde_json::to_string(&WorkType::RigidPavement).unwrap(),
            "\"rigid-pavement\""
        );
        assert_eq!(
            serde_json::to_string(&MaintenanceType::PeriodicRehabilitation).unwrap(),
            "\"periodic-rehabilitation\""
        );
    }

    #[test]
    fn metadata_enums_parse_loosely() {
        assert_eq!("jas".parse::<RoadHierarchy>().unwrap(), RoadHierarchy::Jas);
        assert_eq!(
            "J-ling Kota".parse::<RoadHierarchy>().unwrap(),
            RoadHierarchy::JlingKota
        );
        assert_eq!("rigid".parse::<WorkType>().unwrap(), WorkType::RigidPavement);
        assert_eq!(
            "routine_maintenance".parse::<MaintenanceType>().unwrap(),
            MaintenanceType::RoutineMaintenance
        );
        assert!("motorway".parse::<RoadHierarchy>().is_err());
    }

    #[test]
    fn project_record_parses_with_lenient_fields() {
        let json = r#"{
            "id": "prj-1",
            "name": "Jl. Merdeka",
            "startDate": "2024-01-01",
            "endDate": "2024-06-30",
            "length": "1250.5",
            "roadHierarchy": "JKS",
            "boq": [{"id": "boq-1", "quantity": 10, "unitPrice": 5}]
        }"#;
        let project: Project = serde_json::from_str(json).expect("parse project");
        assert!((project.length_m - 1250.5).abs() < f64::EPSILON);
        assert!(project.average_width_m.abs() < f64::EPSILON);
        assert_eq!(project.road_hierarchy, Some(RoadHierarchy::Jks));
        assert!(project.weekly_reports.is_empty());
        assert!(project.boq_item("boq-1").is_some());
        assert!(project.boq_item("boq-2").is_none());
    }

    #[test]
    fn new_project_has_prefixed_id_and_window() {
        let project = Project::new("Ring road", date(2024, 1, 1), date(2024, 3, 1));
        assert!(project.id.starts_with("prj-"));
        assert!(!project.window().is_degenerate());
        assert!(ContractWindow::new(date(2024, 3, 1), date(2024, 3, 1)).is_degenerate());
    }
}
