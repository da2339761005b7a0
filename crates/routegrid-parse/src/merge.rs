use std::collections::BTreeMap;

use routegrid_spec::{Field, NodeKind};

use crate::document::Node;
use crate::error::SheetError;
use crate::grid::CellValue;
use crate::hints::HintRow;

/// Path-to-kind lookup for merge decisions, including the leaves of
/// choice alternatives (they share the parent's dotted namespace).
#[derive(Debug, Clone)]
pub struct FieldIndex {
    map: BTreeMap<String, FieldInfo>,
}

#[derive(Debug, Clone, Copy)]
struct FieldInfo {
    kind: NodeKind,
    is_array: bool,
}

impl FieldIndex {
    pub fn new(fields: &[Field]) -> Self {
        let mut map = BTreeMap::new();
        collect(fields, &mut map);
        Self { map }
    }

    fn kind(&self, path: &str) -> Option<NodeKind> {
        self.map.get(path).map(|info| info.kind)
    }

    fn is_array(&self, path: &str) -> bool {
        self.map.get(path).is_some_and(|info| info.is_array)
    }
}

fn collect(fields: &[Field], map: &mut BTreeMap<String, FieldInfo>) {
    for field in fields {
        map.entry(field.name.clone()).or_insert(FieldInfo {
            kind: field.kind,
            is_array: field.schema.is_array(),
        });
        for alternative in &field.choices {
            collect(alternative, map);
        }
    }
}

/// Turn one matrix row into a partial nested record. Blank cells are
/// skipped, so untouched optional paths stay absent.
pub fn build_record(row: &[CellValue], hints: &HintRow) -> Node {
    let mut record = Node::object();
    for (cell, (path, _)) in row.iter().zip(&hints.columns) {
        if let Some(value) = Node::from_cell(cell) {
            record.set_path(path, value);
        }
    }
    record
}

/// Fold one row record into the accumulated sheet document.
///
/// Node kinds drive the semantics: a `List` group keeps a container
/// object, a `ListId` value re-roots the rest of the record into that
/// dictionary entry, array-typed leaves collect delimited tokens across
/// rows, and plain scalars are last-row-wins — except inside a
/// dictionary entry, where overwriting a scalar with a different value
/// is reported as a duplicate-id conflict.
pub fn merge_record(doc: &mut Node, record: Node, index: &FieldIndex) -> Result<(), SheetError> {
    match (doc, record) {
        (Node::Object(dst), Node::Object(src)) => merge_level(dst, src, "", index, None),
        _ => Ok(()),
    }
}

fn merge_level(
    dst: &mut BTreeMap<String, Node>,
    mut src: BTreeMap<String, Node>,
    base: &str,
    index: &FieldIndex,
    entry_id: Option<&str>,
) -> Result<(), SheetError> {
    // A dictionary id re-roots the whole record level, not just the
    // keys that happen to sort after it.
    let id_key = src
        .keys()
        .find(|key| index.kind(&join(base, key)) == Some(NodeKind::ListId))
        .cloned();

    if let Some(key) = id_key {
        let id = src
            .remove(&key)
            .map(|node| node.scalar_string())
            .unwrap_or_default();
        let entry = dst.entry(id.clone()).or_insert_with(Node::object);
        if !matches!(entry, Node::Object(_)) {
            *entry = Node::object();
        }
        let Node::Object(entry_map) = entry else {
            unreachable!("entry was just normalized to an object")
        };
        return merge_keys(entry_map, src, base, index, Some(&id));
    }

    merge_keys(dst, src, base, index, entry_id)
}

fn merge_keys(
    dst: &mut BTreeMap<String, Node>,
    src: BTreeMap<String, Node>,
    base: &str,
    index: &FieldIndex,
    entry_id: Option<&str>,
) -> Result<(), SheetError> {
    for (key, value) in src {
        let path = join(base, &key);

        if index.kind(&path) == Some(NodeKind::List) {
            let container = dst.entry(key).or_insert_with(Node::object);
            if !matches!(container, Node::Object(_)) {
                *container = Node::object();
            }
            if let (Node::Object(existing), Node::Object(incoming)) = (container, value) {
                merge_level(existing, incoming, &path, index, None)?;
            }
            continue;
        }

        match (dst.get_mut(&key), value) {
            (Some(Node::Object(existing)), Node::Object(incoming)) => {
                merge_level(existing, incoming, &path, index, entry_id)?;
            }
            (Some(Node::Array(items)), incoming) => {
                items.extend(split_delimited(incoming));
            }
            (existing, incoming) => {
                if index.is_array(&path) {
                    dst.insert(key, Node::Array(split_delimited(incoming)));
                } else {
                    if let (Some(id), Some(old)) = (entry_id, existing.as_deref()) {
                        if old.is_scalar() && incoming.is_scalar() && *old != incoming {
                            return Err(SheetError::ConflictingValue {
                                path,
                                id: id.to_string(),
                                existing: old.scalar_string(),
                                incoming: incoming.scalar_string(),
                            });
                        }
                    }
                    dst.insert(key, incoming);
                }
            }
        }
    }
    Ok(())
}

/// Parse a cell as a delimited list: split on `", "`, trim each token.
/// Non-text scalars become a single-element list.
fn split_delimited(value: Node) -> Vec<Node> {
    match value {
        Node::Text(s) => s
            .split(", ")
            .map(|token| Node::Text(token.trim().to_string()))
            .collect(),
        other => vec![other],
    }
}

fn join(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{base}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routegrid_spec::{SchemaNode, flatten};

    fn index_for(schema: serde_json::Value) -> FieldIndex {
        let schema: SchemaNode = serde_json::from_value(schema).expect("schema");
        FieldIndex::new(&flatten(&schema, None).expect("flatten"))
    }

    fn hints(paths: &[&str]) -> HintRow {
        HintRow {
            row: 0,
            columns: paths
                .iter()
                .enumerate()
                .map(|(col, path)| (path.to_string(), col))
                .collect(),
        }
    }

    #[test]
    fn csv_cell_splits_into_string_array() {
        let index = index_for(serde_json::json!({
            "type": "object",
            "properties": {
                "tags": { "type": "array", "items": { "type": "string" } }
            }
        }));
        let hints = hints(&["tags"]);

        let mut doc = Node::object();
        let record = build_record(&["A, B, C".into()], &hints);
        merge_record(&mut doc, record, &index).expect("merge");
        assert_eq!(doc.to_json(), serde_json::json!({ "tags": ["A", "B", "C"] }));

        let mut doc = Node::object();
        let record = build_record(&["A".into()], &hints);
        merge_record(&mut doc, record, &index).expect("merge");
        assert_eq!(doc.to_json(), serde_json::json!({ "tags": ["A"] }));
    }

    #[test]
    fn rows_sharing_an_id_extend_array_fields_in_row_order() {
        let index = index_for(serde_json::json!({
            "type": "object",
            "additionalProperties": {
                "type": "object",
                "properties": {
                    "visits": { "type": "array", "items": { "type": "string" } }
                }
            }
        }));
        let hints = hints(&["id", "visits"]);

        let mut doc = Node::object();
        for visit in ["s1", "s2", "s3"] {
            let record = build_record(&["v1".into(), visit.into()], &hints);
            merge_record(&mut doc, record, &index).expect("merge");
        }
        assert_eq!(
            doc.to_json(),
            serde_json::json!({ "v1": { "visits": ["s1", "s2", "s3"] } })
        );
    }

    #[test]
    fn conflicting_scalar_within_one_entry_is_rejected() {
        let index = index_for(serde_json::json!({
            "type": "object",
            "additionalProperties": {
                "type": "object",
                "properties": { "name": { "type": "string" } }
            }
        }));
        let hints = hints(&["id", "name"]);

        let mut doc = Node::object();
        let first = build_record(&["d1".into(), "North".into()], &hints);
        merge_record(&mut doc, first, &index).expect("merge");

        // restating the same value is fine
        let same = build_record(&["d1".into(), "North".into()], &hints);
        merge_record(&mut doc, same, &index).expect("merge");

        let conflicting = build_record(&["d1".into(), "South".into()], &hints);
        let err = merge_record(&mut doc, conflicting, &index).expect_err("conflict");
        assert!(matches!(
            err,
            SheetError::ConflictingValue { ref path, ref id, .. }
                if path == "name" && id == "d1"
        ));
    }

    #[test]
    fn plain_scalars_are_last_row_wins() {
        let index = index_for(serde_json::json!({
            "type": "object",
            "properties": { "quality": { "type": "string" } }
        }));
        let hints = hints(&["quality"]);

        let mut doc = Node::object();
        for value in ["normal", "high"] {
            let record = build_record(&[value.into()], &hints);
            merge_record(&mut doc, record, &index).expect("merge");
        }
        assert_eq!(doc.to_json(), serde_json::json!({ "quality": "high" }));
    }
}
