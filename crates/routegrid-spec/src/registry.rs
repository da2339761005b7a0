use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FlattenError;
use crate::field::{Field, collect_leaf_names};
use crate::flatten::{PatchHook, flatten};
use crate::schema::SchemaNode;

/// The closed set of logical sheets a routing workbook carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetKey {
    Depots,
    Sites,
    Fleet,
    Constraints,
    Options,
}

impl SheetKey {
    pub const ALL: [SheetKey; 5] = [
        SheetKey::Depots,
        SheetKey::Sites,
        SheetKey::Fleet,
        SheetKey::Constraints,
        SheetKey::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SheetKey::Depots => "depots",
            SheetKey::Sites => "sites",
            SheetKey::Fleet => "fleet",
            SheetKey::Constraints => "constraints",
            SheetKey::Options => "options",
        }
    }

    /// Default worksheet display name.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            SheetKey::Depots => "Depots",
            SheetKey::Sites => "Sites",
            SheetKey::Fleet => "Fleet",
            SheetKey::Constraints => "Constraints",
            SheetKey::Options => "Options",
        }
    }
}

impl fmt::Display for SheetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sheet's flattened schema: the worksheet display name plus the
/// ordered field list produced by [`flatten`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSchema {
    pub sheet_name: String,
    pub fields: Vec<Field>,
}

impl SheetSchema {
    /// Flatten `root` for a sheet identified by `key`.
    pub fn from_schema(
        key: SheetKey,
        root: &SchemaNode,
        patch: Option<PatchHook<'_>>,
    ) -> Result<Self, FlattenError> {
        Ok(Self {
            sheet_name: key.sheet_name().to_string(),
            fields: flatten(root, patch)?,
        })
    }

    /// Every column-addressable leaf path, choice alternatives included.
    pub fn leaf_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        collect_leaf_names(&self.fields, &mut names);
        names
    }
}

/// The flattened registry for a whole workbook, keyed by [`SheetKey`].
///
/// Serializes to plain JSON so a pre-flattened registry can ship as a
/// committed artifact and be loaded without the source schemas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkbookSchema {
    pub sheets: BTreeMap<SheetKey, SheetSchema>,
}

impl WorkbookSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: SheetKey, sheet: SheetSchema) {
        self.sheets.insert(key, sheet);
    }

    pub fn get(&self, key: SheetKey) -> Option<&SheetSchema> {
        self.sheets.get(&key)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
