use chrono::NaiveDateTime;

/// A typed spreadsheet cell as the parser sees it.
///
/// Styling, formulas and named ranges never reach this layer; loaders
/// hand over evaluated values only.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    /// Native date/time cell. Kept naive: interpretation against the
    /// plan timezone happens during time-window resolution.
    DateTime(NaiveDateTime),
    #[default]
    Empty,
}

impl CellValue {
    /// Blank for the purposes of hint scanning and matrix termination:
    /// an empty cell or an empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

/// One worksheet as a rectangular grid of typed cells, 0-based.
#[derive(Debug, Clone, Default)]
pub struct Worksheet {
    name: String,
    rows: Vec<Vec<CellValue>>,
}

const EMPTY_CELL: CellValue = CellValue::Empty;

impl Worksheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell at `(row, col)`; out-of-range reads are empty, mirroring
    /// how spreadsheets treat untouched cells.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(col))
            .unwrap_or(&EMPTY_CELL)
    }
}

/// An in-memory workbook: the already-loaded grids, looked up by the
/// worksheet display name the registry prescribes.
#[derive(Debug, Clone, Default)]
pub struct WorkbookGrid {
    sheets: Vec<Worksheet>,
}

impl WorkbookGrid {
    pub fn new(sheets: Vec<Worksheet>) -> Self {
        Self { sheets }
    }

    pub fn sheet(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|ws| ws.name() == name)
    }
}
