use std::collections::{BTreeMap, HashSet};

use routegrid_spec::{Field, NodeKind, SheetKey, WorkbookSchema, collect_leaf_names};
use serde_json::Value as JsonValue;

use crate::document::Node;
use crate::error::{ParseIssue, SheetError};
use crate::grid::{CellValue, WorkbookGrid};
use crate::hints::{HintRow, locate_hints};
use crate::matrix::{DATA_ROW_OFFSET, Matrix, extract_matrix};
use crate::merge::{FieldIndex, build_record, merge_record};
use crate::timewindow::{plan_context, rewrite_time_windows};

/// Everything one workbook parse produces.
///
/// Diagnostics never abort the whole parse: a broken sheet yields an
/// empty document and its issues, and the remaining sheets still parse.
#[derive(Debug, Default)]
pub struct ParseResult {
    /// Reconstructed nested document per sheet.
    pub documents: BTreeMap<SheetKey, JsonValue>,
    /// Raw extracted data rows per sheet, for callers that post-process
    /// cells themselves.
    pub matrices: BTreeMap<SheetKey, Matrix>,
    /// Recorded diagnostics, in the order they were encountered.
    pub errors: BTreeMap<SheetKey, Vec<ParseIssue>>,
}

impl ParseResult {
    pub fn is_clean(&self) -> bool {
        self.errors.values().all(Vec::is_empty)
    }

    fn record(&mut self, key: SheetKey, issue: ParseIssue) {
        self.errors.entry(key).or_default().push(issue);
    }
}

/// Parse a loaded workbook against the flattened registry.
///
/// Every sheet in the registry is located by display name, its hint row
/// found, its data rows merged into a nested document, and finally the
/// time-window pass anchors relative times using the options sheet.
pub fn parse_workbook(schema: &WorkbookSchema, grid: &WorkbookGrid) -> ParseResult {
    let mut result = ParseResult::default();
    let mut documents: BTreeMap<SheetKey, Node> = BTreeMap::new();

    for key in SheetKey::ALL {
        let Some(sheet_schema) = schema.get(key) else {
            continue;
        };
        // A broken sheet still contributes an empty document.
        let doc = documents.entry(key).or_insert_with(Node::object);

        let Some(ws) = grid.sheet(&sheet_schema.sheet_name) else {
            result.record(
                key,
                SheetError::SheetNotFound {
                    sheet: sheet_schema.sheet_name.clone(),
                }
                .into(),
            );
            continue;
        };

        let leaf_names: HashSet<&str> = sheet_schema.leaf_names().into_iter().collect();
        let hints = match locate_hints(ws, &leaf_names) {
            Ok(hints) => hints,
            Err(err) => {
                result.record(key, err.into());
                continue;
            }
        };

        let matrix = extract_matrix(ws, &hints);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            sheet = %key,
            hint_row = hints.row,
            rows = matrix.len(),
            columns = hints.columns.len(),
            "extracted data matrix"
        );

        let index = FieldIndex::new(&sheet_schema.fields);
        let choices = choice_groups(&sheet_schema.fields);

        for (row_idx, row) in matrix.iter().enumerate() {
            // 1-based worksheet row, for diagnostics.
            let ws_row = hints.row + DATA_ROW_OFFSET + row_idx + 1;

            if let Some(path) = ambiguous_choice(row, &hints, &choices) {
                result.record(
                    key,
                    ParseIssue::at_row(
                        ws_row,
                        SheetError::AmbiguousChoice { path }.to_string(),
                    ),
                );
                continue;
            }

            let record = build_record(row, &hints);
            if let Err(err) = merge_record(doc, record, &index) {
                result.record(key, ParseIssue::at_row(ws_row, err.to_string()));
            }
        }

        result.matrices.insert(key, matrix);
    }

    match plan_context(&documents) {
        Ok((zone, date)) => {
            for (key, doc) in documents.iter_mut() {
                if let Err(err) = rewrite_time_windows(doc, zone, date) {
                    result.record(*key, err.into());
                }
            }
        }
        Err(err) => result.record(SheetKey::Options, err.into()),
    }

    for (key, doc) in documents {
        result.documents.insert(key, doc.to_json());
    }
    result
}

/// `(choice path, leaf names per alternative)` for every choice in the
/// field tree.
fn choice_groups(fields: &[Field]) -> Vec<(String, Vec<HashSet<String>>)> {
    let mut groups = Vec::new();
    collect_choices(fields, &mut groups);
    groups
}

fn collect_choices(fields: &[Field], out: &mut Vec<(String, Vec<HashSet<String>>)>) {
    for field in fields {
        if field.kind == NodeKind::Choice {
            let alternatives = field
                .choices
                .iter()
                .map(|alternative| {
                    let mut names = Vec::new();
                    collect_leaf_names(alternative, &mut names);
                    names.into_iter().map(str::to_string).collect()
                })
                .collect();
            out.push((field.name.clone(), alternatives));
        }
        for alternative in &field.choices {
            collect_choices(alternative, out);
        }
    }
}

/// Exactly one alternative of each choice may carry values in a row.
/// Returns the path of the first violated choice.
fn ambiguous_choice(
    row: &[CellValue],
    hints: &HintRow,
    choices: &[(String, Vec<HashSet<String>>)],
) -> Option<String> {
    if choices.is_empty() {
        return None;
    }

    let populated: HashSet<&str> = row
        .iter()
        .zip(&hints.columns)
        .filter(|(cell, _)| !cell.is_blank())
        .map(|(_, (path, _))| path.as_str())
        .collect();

    for (path, alternatives) in choices {
        let hit = alternatives
            .iter()
            .filter(|leaves| leaves.iter().any(|leaf| populated.contains(leaf.as_str())))
            .count();
        if hit > 1 {
            return Some(path.clone());
        }
    }
    None
}
