use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-sheet parse failures.
///
/// Hint-location variants abort the sheet (without a column map no row
/// can be interpreted); merge variants are per-row and recorded while
/// the rest of the sheet keeps parsing.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Sheet '{sheet}' is required but not found")]
    SheetNotFound { sheet: String },

    #[error("worksheet `{sheet}` does not have a column hint row")]
    NoColumnHints { sheet: String },

    #[error(
        "worksheet `{sheet}` row {row} appears to hold column hints, but cell {col} with value `{value}` is not a known column name"
    )]
    InvalidColumnHint {
        sheet: String,
        /// 1-based worksheet row.
        row: usize,
        /// 1-based worksheet column.
        col: usize,
        value: String,
    },

    #[error("conflicting value for `{path}` in entry `{id}`: `{existing}` vs `{incoming}`")]
    ConflictingValue {
        path: String,
        id: String,
        existing: String,
        incoming: String,
    },

    #[error("more than one alternative of choice `{path}` is populated")]
    AmbiguousChoice { path: String },
}

/// Time-window resolution failures. Fatal to the post-processing pass
/// of the sheet they occur in; the offending field path is attached via
/// [`TimeError::at`].
#[derive(Debug, Error)]
pub enum TimeError {
    #[error("invalid date `{value}`")]
    InvalidDate { value: String },

    #[error("invalid timestamp `{value}`")]
    InvalidTimestamp { value: String },

    #[error(
        "invalid relative time `{value}`: expected `HH:mm` or `HH:mm:ss`, optionally followed by a single `+Nd` or `-Nd` day offset"
    )]
    InvalidRelativeTime { value: String },

    #[error("maximum relative day offset is 100 days, got {days}")]
    RelativeDayOffsetTooLarge { days: i64 },

    #[error("datetime cell `{value}` is not a zero-base (1899-12-30) time-of-day value")]
    NotAZeroBaseDate { value: String },

    #[error("unknown timezone `{zone}`")]
    UnknownTimezone { zone: String },

    #[error("local time `{value}` does not exist in timezone `{zone}`")]
    NonexistentLocalTime { value: String, zone: String },

    #[error("`options.date` is required to anchor time windows")]
    MissingPlanDate,

    #[error("{source} (at `{path}`)")]
    AtField {
        path: String,
        #[source]
        source: Box<TimeError>,
    },
}

impl TimeError {
    /// Attach the document path of the offending field.
    pub fn at(self, path: &str) -> TimeError {
        match self {
            // Keep the innermost path; callers wrap outside-in.
            TimeError::AtField { .. } => self,
            other => TimeError::AtField {
                path: path.to_string(),
                source: Box::new(other),
            },
        }
    }
}

/// One recorded diagnostic, ordered per sheet in the parse result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    /// Worksheet location (`row N`) when the issue is row-scoped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub message: String,
}

impl ParseIssue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            address: None,
            message: message.into(),
        }
    }

    pub fn at_row(row: usize, message: impl Into<String>) -> Self {
        Self {
            address: Some(format!("row {row}")),
            message: message.into(),
        }
    }
}

impl From<SheetError> for ParseIssue {
    fn from(err: SheetError) -> Self {
        ParseIssue::new(err.to_string())
    }
}

impl From<TimeError> for ParseIssue {
    fn from(err: TimeError) -> Self {
        ParseIssue::new(err.to_string())
    }
}
