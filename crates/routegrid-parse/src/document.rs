use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde_json::{Number, Value as JsonValue};

use crate::grid::CellValue;

/// Owned document tree built by merging row records.
///
/// Intermediate levels are created explicitly while descending dotted
/// paths; scalars keep their cell type (date cells stay dates until the
/// time-window pass rewrites them).
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Array(Vec<Node>),
    Object(BTreeMap<String, Node>),
}

impl Node {
    pub fn object() -> Node {
        Node::Object(BTreeMap::new())
    }

    /// Convert a cell into a scalar node; blank cells carry no value.
    pub fn from_cell(cell: &CellValue) -> Option<Node> {
        match cell {
            CellValue::Empty => None,
            CellValue::Text(s) if s.is_empty() => None,
            CellValue::Text(s) => Some(Node::Text(s.clone())),
            CellValue::Number(n) => Some(Node::Number(*n)),
            CellValue::Boolean(b) => Some(Node::Bool(*b)),
            CellValue::DateTime(dt) => Some(Node::DateTime(*dt)),
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut BTreeMap<String, Node>> {
        match self {
            Node::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, Node::Array(_) | Node::Object(_))
    }

    /// Assign `value` at a dotted `path`, creating intermediate object
    /// levels on demand. A non-object node standing where a deeper
    /// level is needed is replaced; the final segment overwrites.
    pub fn set_path(&mut self, path: &str, value: Node) {
        match path.split_once('.') {
            None => {
                if let Node::Object(map) = self {
                    map.insert(path.to_string(), value);
                }
            }
            Some((head, rest)) => {
                if let Node::Object(map) = self {
                    let child = map.entry(head.to_string()).or_insert_with(Node::object);
                    if !matches!(child, Node::Object(_)) {
                        *child = Node::object();
                    }
                    child.set_path(rest, value);
                }
            }
        }
    }

    /// Render a scalar the way it reads in a cell, used for dictionary
    /// keys and diagnostics. Whole numbers drop the fraction.
    pub fn scalar_string(&self) -> String {
        match self {
            Node::Text(s) => s.clone(),
            Node::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            Node::Number(n) => n.to_string(),
            Node::Bool(b) => b.to_string(),
            Node::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Node::Array(_) => "[array]".to_string(),
            Node::Object(_) => "[object]".to_string(),
        }
    }

    /// Convert the finalized document to JSON. Residual date cells
    /// serialize as naive ISO-8601 strings.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Node::Text(s) => JsonValue::String(s.clone()),
            Node::Number(n) => Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Node::Bool(b) => JsonValue::Bool(*b),
            Node::DateTime(dt) => {
                JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
            Node::Array(items) => JsonValue::Array(items.iter().map(Node::to_json).collect()),
            Node::Object(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_path_creates_intermediate_levels() {
        let mut doc = Node::object();
        doc.set_path("time_window.start", Node::Text("09:00".into()));
        doc.set_path("time_window.end", Node::Text("18:00".into()));
        doc.set_path("name", Node::Text("North".into()));

        let json = doc.to_json();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "North",
                "time_window": { "start": "09:00", "end": "18:00" }
            })
        );
    }

    #[test]
    fn final_segment_overwrites() {
        let mut doc = Node::object();
        doc.set_path("a.b", Node::Number(1.0));
        doc.set_path("a.b", Node::Number(2.0));
        assert_eq!(doc.to_json(), serde_json::json!({ "a": { "b": 2.0 } }));
    }

    #[test]
    fn scalar_string_drops_whole_number_fraction() {
        assert_eq!(Node::Number(42.0).scalar_string(), "42");
        assert_eq!(Node::Number(1.5).scalar_string(), "1.5");
        assert_eq!(Node::Text("d1".into()).scalar_string(), "d1");
    }
}
