use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::FlattenError;

/// One node of an already-dereferenced JSON-Schema tree.
///
/// Only the subset the flattener consumes is modeled: `type`,
/// `properties`, bool-or-schema `additionalProperties` (id-keyed
/// dictionaries), `items`, `oneOf` (tagged choices), `allOf`
/// (description overlay), `required`, plus the cosmetic metadata that
/// survives into [`crate::Field`] descriptors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, SchemaNode>>,
    #[serde(
        rename = "additionalProperties",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    #[serde(rename = "oneOf", default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<SchemaNode>>,
    #[serde(rename = "allOf", default, skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<SchemaNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub r#enum: Option<Vec<JsonValue>>,
}

/// `additionalProperties` union: the boolean form toggles open maps in
/// JSON Schema, the schema form marks an id-keyed dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Bool(bool),
    Schema(Box<SchemaNode>),
}

impl SchemaNode {
    /// Convenience constructor for synthetic leaves (the dictionary id).
    pub fn string_leaf(description: &str) -> Self {
        Self {
            ty: Some("string".to_string()),
            description: Some(description.to_string()),
            ..Self::default()
        }
    }

    pub fn is_array(&self) -> bool {
        self.ty.as_deref() == Some("array")
    }

    pub fn is_object(&self) -> bool {
        self.ty.as_deref() == Some("object")
    }

    /// Id-keyed dictionary: `additionalProperties` carries a schema.
    pub fn is_dict(&self) -> bool {
        matches!(
            self.additional_properties,
            Some(AdditionalProperties::Schema(_))
        )
    }

    /// Tagged union of alternative sub-trees.
    pub fn is_choice(&self) -> bool {
        self.one_of.is_some()
    }

    /// Neither array, object nor choice: a single-cell value.
    pub fn is_leaf(&self) -> bool {
        !self.is_array() && !self.is_object() && !self.is_choice()
    }

    /// Dictionary value schema, when this node is a dictionary.
    pub fn dict_value(&self) -> Option<&SchemaNode> {
        match &self.additional_properties {
            Some(AdditionalProperties::Schema(inner)) => Some(inner),
            _ => None,
        }
    }

    /// Whether `name` appears in this node's `required` list.
    pub fn requires(&self, name: &str) -> bool {
        self.required
            .as_ref()
            .is_some_and(|names| names.iter().any(|n| n == name))
    }

    /// Collapse the `allOf: [base]` + sibling `description` convention
    /// back to the base node with the description replaced.
    ///
    /// The routing schema comments `$ref` entries this way; anything
    /// other than a single-element `allOf` is an unsupported shape.
    pub fn effective(&self, path: &str) -> Result<SchemaNode, FlattenError> {
        let Some(all_of) = &self.all_of else {
            return Ok(self.clone());
        };
        let [base] = all_of.as_slice() else {
            return Err(FlattenError::UnsupportedShape {
                path: path.to_string(),
                reason: format!("`allOf` must hold exactly one schema, found {}", all_of.len()),
            });
        };
        let mut merged = base.clone();
        if self.description.is_some() {
            merged.description = self.description.clone();
        }
        Ok(merged)
    }
}
