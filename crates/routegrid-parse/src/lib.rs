//! Routegrid runtime side.
//!
//! Given a flattened [`WorkbookSchema`](routegrid_spec::WorkbookSchema)
//! registry and an in-memory [`WorkbookGrid`], this crate locates each
//! sheet's column-hint row, extracts its data rows into a matrix,
//! merges the rows back into nested documents (dictionaries keyed by
//! their id column, delimited cells split into arrays), and finally
//! anchors relative time windows to the plan date and timezone read
//! from the options sheet.
//!
//! Diagnostics accumulate per sheet instead of aborting the parse; see
//! [`ParseResult`].

mod datetime;
mod document;
mod error;
mod grid;
mod hints;
mod matrix;
mod merge;
mod runtime;
mod timewindow;

pub use datetime::{
    ISO_OFFSET_FORMAT, MAX_RELATIVE_DAYS, RelativeTime, anchor, parse_plan_date,
    parse_relative_time, parse_timestamp, resolve_zone, time_to_duration, time_to_timestamp,
    time_to_timestamp_checked, timestamp_to_time,
};
pub use document::Node;
pub use error::{ParseIssue, SheetError, TimeError};
pub use grid::{CellValue, WorkbookGrid, Worksheet};
pub use hints::{HintRow, locate_hints};
pub use matrix::{DATA_ROW_OFFSET, Matrix, extract_matrix};
pub use merge::{FieldIndex, build_record, merge_record};
pub use runtime::{ParseResult, parse_workbook};
pub use timewindow::{plan_context, resolve_time_windows, rewrite_time_windows};
