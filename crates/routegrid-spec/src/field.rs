use serde::{Deserialize, Serialize};

use crate::schema::SchemaNode;

/// Structural classification of a flattened field.
///
/// Closed set on purpose: the flattener and the row merger both match
/// exhaustively, so a new kind forces every consumer to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Scalar (or packed delimited-array) value, one spreadsheet column.
    Leaf,
    /// Nested object group.
    Object,
    /// Repeating group: id-keyed dictionary or array of objects.
    List,
    /// Synthetic `<base>.id` leaf keying a dictionary-backed list.
    ListId,
    /// Tagged union; exactly one alternative populated at a time.
    Choice,
}

/// One flattened field: a dotted path plus enough schema context to
/// place a spreadsheet column and to merge row values back into the
/// nested document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Dotted path, unique within one sheet schema.
    pub name: String,
    pub kind: NodeKind,
    pub required: bool,
    /// The (collapsed) schema fragment this field was flattened from.
    pub schema: SchemaNode,
    /// Alternative sub-trees, populated only for `NodeKind::Choice`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Vec<Field>>,
}

impl Field {
    /// Whether the field is addressable by a single column.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf | NodeKind::ListId)
    }
}

/// Collect every column-addressable leaf name in `fields`, descending
/// into choice alternatives (their leaves are valid column hints too).
pub fn collect_leaf_names<'a>(fields: &'a [Field], out: &mut Vec<&'a str>) {
    for field in fields {
        if field.is_leaf() {
            out.push(field.name.as_str());
        }
        for alternative in &field.choices {
            collect_leaf_names(alternative, out);
        }
    }
}
