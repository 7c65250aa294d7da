use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::ErrorCode;

/// Schedule health: physical progress compared against elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleStatus {
    Ahead,
    OnTrack,
    AtRisk,
    Delayed,
}

impl ScheduleStatus {
    /// All variants, best to worst.
    pub const ALL: [Self; 4] = [Self::Ahead, Self::OnTrack, Self::AtRisk, Self::Delayed];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ahead => "ahead",
            Self::OnTrack => "on-track",
            Self::AtRisk => "at-risk",
            Self::Delayed => "delayed",
        }
    }

    /// `true` for the two statuses that need supervisor attention.
    #[must_use]
    pub const fn is_behind(self) -> bool {
        matches!(self, Self::AtRisk | Self::Delayed)
    }
}

/// Where "now" sits relative to the contract window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeadlineStatus {
    Upcoming,
    Active,
    EndingSoon,
    Overdue,
}

impl DeadlineStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::EndingSoon => "ending-soon",
            Self::Overdue => "overdue",
        }
    }
}

/// How recently the contractor last reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Staleness {
    Fresh,
    Stale,
    Critical,
}

impl Staleness {
    pub const ALL: [Self; 3] = [Self::Fresh, Self::Stale, Self::Critical];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Stale => "stale",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DeadlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl ParseEnumError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidEnumValue
    }
}

pub(crate) fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase().replace('_', "-")
}

impl FromStr for ScheduleStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "ahead" => Ok(Self::Ahead),
            "on-track" => Ok(Self::OnTrack),
            "at-risk" => Ok(Self::AtRisk),
            "delayed" => Ok(Self::Delayed),
            _ => Err(ParseEnumError {
                expected: "schedule status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for DeadlineStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "upcoming" => Ok(Self::Upcoming),
            "active" => Ok(Self::Active),
            "ending-soon" => Ok(Self::EndingSoon),
            "overdue" => Ok(Self::Overdue),
            _ => Err(ParseEnumError {
                expected: "deadline status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Staleness {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "fresh" => Ok(Self::Fresh),
            "stale" => Ok(Self::Stale),
            "critical" => Ok(Self::Critical),
            _ => Err(ParseEnumError {
                expected: "staleness",
                got: s.to_string(),
            }),
        }
    }
}
