use crate::grid::{CellValue, Worksheet};
use crate::hints::HintRow;

/// Rows reserved between the hint row and the first data row (type and
/// help annotations written by the template generator). Hard contract
/// with the upstream producer.
pub const DATA_ROW_OFFSET: usize = 3;

/// Extracted data rows, aligned to the hint row's column order.
pub type Matrix = Vec<Vec<CellValue>>;

/// Read data rows below the hint row into a rectangular matrix.
///
/// Only hinted columns are read, in column-map order. Extraction stops
/// at the first row where every hinted cell is blank; that row and
/// everything after it are discarded.
pub fn extract_matrix(ws: &Worksheet, hints: &HintRow) -> Matrix {
    let mut matrix = Matrix::new();

    for row in (hints.row + DATA_ROW_OFFSET)..ws.row_count() {
        let cells: Vec<CellValue> = hints
            .columns
            .iter()
            .map(|(_, col)| ws.cell(row, *col).clone())
            .collect();

        if cells.iter().all(CellValue::is_blank) {
            break;
        }
        matrix.push(cells);
    }

    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hint_row() -> HintRow {
        HintRow {
            row: 0,
            columns: vec![("id".to_string(), 0), ("name".to_string(), 1)],
        }
    }

    fn sheet(rows: Vec<Vec<CellValue>>) -> Worksheet {
        Worksheet::new("Depots", rows)
    }

    #[test]
    fn extraction_starts_at_the_fixed_offset() {
        let ws = sheet(vec![
            vec!["id".into(), "name".into()],
            vec!["string*".into(), "string".into()],
            vec!["help".into(), "help".into()],
            vec!["d1".into(), "North".into()],
        ]);
        let matrix = extract_matrix(&ws, &hint_row());
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix[0], vec![CellValue::from("d1"), CellValue::from("North")]);
    }

    #[test]
    fn first_blank_row_terminates_extraction() {
        let ws = sheet(vec![
            vec![],
            vec![],
            vec![],
            vec!["d1".into(), "North".into()],
            vec!["d2".into(), "South".into()],
            vec![CellValue::Empty, CellValue::Text(String::new())],
            vec!["d3".into(), "ignored".into()],
        ]);
        let matrix = extract_matrix(&ws, &hint_row());
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix[1][0], CellValue::from("d2"));
    }

    #[test]
    fn only_hinted_columns_are_read() {
        let hints = HintRow {
            row: 0,
            columns: vec![("name".to_string(), 2), ("id".to_string(), 0)],
        };
        let ws = sheet(vec![
            vec![],
            vec![],
            vec![],
            vec!["d1".into(), "noise".into(), "North".into()],
        ]);
        let matrix = extract_matrix(&ws, &hints);
        // column-map order, not worksheet order
        assert_eq!(matrix[0], vec![CellValue::from("North"), CellValue::from("d1")]);
    }
}
