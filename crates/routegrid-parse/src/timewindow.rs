use std::collections::BTreeMap;

use chrono::NaiveDate;
use chrono_tz::Tz;
use routegrid_spec::SheetKey;

use crate::datetime::{
    ISO_OFFSET_FORMAT, RelativeTime, anchor, parse_plan_date, parse_relative_time, resolve_zone,
};
use crate::document::Node;
use crate::error::TimeError;

/// Epoch date of a spreadsheet time-of-day cell: a bare clock value is
/// stored as this date plus the time fraction.
const ZERO_BASE: Option<NaiveDate> = NaiveDate::from_ymd_opt(1899, 12, 30);

/// Fields resolved inside every object named this way.
const TIME_WINDOW_KEY: &str = "time_window";
const BOUND_KEYS: [&str; 2] = ["start", "end"];

/// Read the plan timezone and date out of the options document.
///
/// `timezone` defaults to UTC when absent; `date` is mandatory, since
/// relative times cannot be anchored without it.
pub fn plan_context(
    documents: &BTreeMap<SheetKey, Node>,
) -> Result<(Tz, NaiveDate), TimeError> {
    let options = documents
        .get(&SheetKey::Options)
        .and_then(Node::as_object);

    let zone = match options.and_then(|map| map.get("timezone")) {
        Some(node) => resolve_zone(&node.scalar_string())?,
        None => Tz::UTC,
    };

    let date = match options.and_then(|map| map.get("date")) {
        Some(Node::DateTime(dt)) => dt.date(),
        Some(node) => parse_plan_date(&node.scalar_string())?,
        None => return Err(TimeError::MissingPlanDate),
    };

    Ok((zone, date))
}

/// Rewrite every `time_window.start` / `time_window.end` in the
/// document into an absolute ISO-8601 timestamp anchored to the plan
/// date in the plan timezone.
///
/// Accepted bound values are relative time strings and native
/// time-of-day cells (zero-base date plus clock time). The first
/// failing bound aborts the pass with its document path attached.
pub fn rewrite_time_windows(doc: &mut Node, zone: Tz, date: NaiveDate) -> Result<(), TimeError> {
    walk(doc, zone, date, "")
}

/// Resolve time windows in every sheet document against the shared plan
/// context. Stops at the first failing bound; callers that want
/// per-sheet diagnostics drive [`rewrite_time_windows`] themselves.
pub fn resolve_time_windows(documents: &mut BTreeMap<SheetKey, Node>) -> Result<(), TimeError> {
    let (zone, date) = plan_context(documents)?;
    for doc in documents.values_mut() {
        rewrite_time_windows(doc, zone, date)?;
    }
    Ok(())
}

fn walk(node: &mut Node, zone: Tz, date: NaiveDate, base: &str) -> Result<(), TimeError> {
    match node {
        Node::Object(map) => {
            for (key, child) in map.iter_mut() {
                let path = join(base, key);
                if key == TIME_WINDOW_KEY {
                    if let Node::Object(window) = child {
                        for bound in BOUND_KEYS {
                            if let Some(value) = window.get_mut(bound) {
                                let path = join(&path, bound);
                                rewrite_bound(value, zone, date)
                                    .map_err(|err| err.at(&path))?;
                            }
                        }
                        continue;
                    }
                }
                walk(child, zone, date, &path)?;
            }
            Ok(())
        }
        Node::Array(items) => {
            for item in items.iter_mut() {
                walk(item, zone, date, base)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn rewrite_bound(value: &mut Node, zone: Tz, date: NaiveDate) -> Result<(), TimeError> {
    let rel = match value {
        Node::Text(text) => parse_relative_time(text)?,
        // Native cells carry a clock time on the zero-base date; any
        // other date means the cell held a full datetime, which the
        // relative grammar has no way to express.
        Node::DateTime(dt) => {
            if ZERO_BASE != Some(dt.date()) {
                return Err(TimeError::NotAZeroBaseDate {
                    value: dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
                });
            }
            RelativeTime {
                time: dt.time(),
                days: 0,
            }
        }
        _ => return Ok(()),
    };

    let anchored = anchor(rel, date, zone)?;
    *value = Node::Text(anchored.format(ISO_OFFSET_FORMAT).to_string());
    Ok(())
}

fn join(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{base}.{key}")
    }
}
