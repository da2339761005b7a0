use std::collections::HashSet;

use crate::error::SheetError;
use crate::grid::{CellValue, Worksheet};

/// The located hint row: its 0-based row index plus the path-to-column
/// map in scanned (left-to-right) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintRow {
    pub row: usize,
    /// `(leaf path, 0-based worksheet column)`, in column order.
    pub columns: Vec<(String, usize)>,
}

/// Scan the worksheet top-to-bottom for the first row whose leading
/// string cells all name known leaf fields.
///
/// Scanning a row stops at the first blank or non-string cell. The
/// first matching cell marks the row as the hint row; any later
/// non-matching string cell in the same scan is fatal, since the row
/// claims to be a header but addresses an unknown column.
pub fn locate_hints(
    ws: &Worksheet,
    leaf_names: &HashSet<&str>,
) -> Result<HintRow, SheetError> {
    for row in 0..ws.row_count() {
        let mut columns: Vec<(String, usize)> = Vec::new();
        let mut found = false;

        let mut col = 0usize;
        loop {
            let cell = ws.cell(row, col);
            let Some(text) = cell.as_text() else { break };
            if text.is_empty() {
                break;
            }

            if leaf_names.contains(text) {
                found = true;
                match columns.iter_mut().find(|(path, _)| path == text) {
                    Some(existing) => existing.1 = col,
                    None => columns.push((text.to_string(), col)),
                }
            } else if found {
                return Err(SheetError::InvalidColumnHint {
                    sheet: ws.name().to_string(),
                    row: row + 1,
                    col: col + 1,
                    value: text.to_string(),
                });
            }
            col += 1;
        }

        if found {
            return Ok(HintRow { row, columns });
        }
    }

    Err(SheetError::NoColumnHints {
        sheet: ws.name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leafs() -> HashSet<&'static str> {
        ["id", "name", "time_window.start"].into_iter().collect()
    }

    fn text_row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|c| CellValue::from(*c)).collect()
    }

    #[test]
    fn first_fully_matching_row_wins() {
        let ws = Worksheet::new(
            "Fleet",
            vec![
                text_row(&["Vehicles", ""]),
                text_row(&["id", "name", "time_window.start"]),
                text_row(&["id", "name"]),
            ],
        );
        let hints = locate_hints(&ws, &leafs()).expect("hint row");
        assert_eq!(hints.row, 1);
        assert_eq!(
            hints.columns,
            vec![
                ("id".to_string(), 0),
                ("name".to_string(), 1),
                ("time_window.start".to_string(), 2),
            ]
        );
    }

    #[test]
    fn scan_stops_at_first_blank_cell() {
        let ws = Worksheet::new(
            "Fleet",
            vec![text_row(&["id", "", "definitely not a hint"])],
        );
        let hints = locate_hints(&ws, &leafs()).expect("hint row");
        assert_eq!(hints.columns, vec![("id".to_string(), 0)]);
    }

    #[test]
    fn unknown_name_after_match_is_fatal() {
        let ws = Worksheet::new("Fleet", vec![text_row(&["id", "wheels"])]);
        let err = locate_hints(&ws, &leafs()).expect_err("must fail");
        assert!(matches!(
            err,
            SheetError::InvalidColumnHint { row: 1, col: 2, ref value, .. } if value == "wheels"
        ));
    }

    #[test]
    fn no_qualifying_row_is_fatal() {
        let ws = Worksheet::new("Fleet", vec![text_row(&["Vehicles"]), vec![]]);
        let err = locate_hints(&ws, &leafs()).expect_err("must fail");
        assert!(matches!(err, SheetError::NoColumnHints { .. }));
    }
}
