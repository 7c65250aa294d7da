use std::fmt;

/// Machine-readable error codes for scripted decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    ProjectNotFound,
    ProjectExists,
    BoqItemNotFound,
    BoqItemExists,
    ReportNotFound,
    ReportRejected,
    InvalidEnumValue,
    ProjectChanged,
    CorruptRecord,
    StoreWriteFailed,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::ProjectNotFound => "E2001",
            Self::ProjectExists => "E2002",
            Self::BoqItemNotFound => "E2003",
            Self::BoqItemExists => "E2007",
            Self::ReportNotFound => "E2004",
            Self::ReportRejected => "E2005",
            Self::InvalidEnumValue => "E2006",
            Self::ProjectChanged => "E2008",
            Self::CorruptRecord => "E3001",
            Self::StoreWriteFailed => "E5001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Workspace not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::ProjectNotFound => "Project not found",
            Self::ProjectExists => "Project already exists",
            Self::BoqItemNotFound => "BoQ item not found",
            Self::BoqItemExists => "BoQ item already exists",
            Self::ReportNotFound => "Weekly report not found",
            Self::ReportRejected => "Weekly report rejected",
            Self::InvalidEnumValue => "Invalid status/type value",
            Self::ProjectChanged => "Project changed since it was read",
            Self::CorruptRecord => "Corrupt project record",
            Self::StoreWriteFailed => "Project store write failed",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `mg init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .marga/config.toml and retry."),
            Self::ProjectNotFound => Some("Run `mg project list` to see known project IDs."),
            Self::ProjectExists => None,
            Self::BoqItemNotFound => Some("Run `mg boq list <project>` to see BoQ item IDs."),
            Self::BoqItemExists => Some("Omit --id to have one generated."),
            Self::ReportNotFound => Some("Run `mg report list <project>` to see report IDs."),
            Self::ReportRejected => {
                Some("Correct every listed violation; quantities may not exceed what remains.")
            }
            Self::InvalidEnumValue => Some("Use one of the documented values."),
            Self::ProjectChanged => Some("Another command updated this project. Re-run to apply on top of it."),
            Self::CorruptRecord => Some("Restore the project record from a backup."),
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
