//! Routegrid schema side.
//!
//! This crate turns a recursively nested, already-dereferenced routing
//! schema (objects, id-keyed dictionaries, arrays, tagged choices) into
//! an ordered list of flattened [`Field`] descriptors with stable dotted
//! paths, and bundles the per-sheet results into a serializable
//! [`WorkbookSchema`] registry. The runtime crate consumes the registry
//! to locate columns and rebuild nested documents from spreadsheet rows.

mod error;
mod field;
mod flatten;
mod registry;
mod schema;

pub use error::FlattenError;
pub use field::{Field, NodeKind, collect_leaf_names};
pub use flatten::{PatchHook, flatten};
pub use registry::{SheetKey, SheetSchema, WorkbookSchema};
pub use schema::{AdditionalProperties, SchemaNode};
