use std::collections::BTreeMap;

use crate::error::FlattenError;
use crate::field::{Field, NodeKind};
use crate::schema::SchemaNode;

/// Cosmetic override hook, invoked with each field's fully-qualified
/// patch path immediately before the field is appended. The hook may
/// rewrite descriptions and similar metadata; changing the field's
/// `name` or `kind` is rejected.
pub type PatchHook<'a> = &'a dyn Fn(&str, Field) -> Field;

/// Flatten a dereferenced schema into the ordered field list.
///
/// Ordering is load-bearing: it fixes the default left-to-right column
/// order of generated templates, so leaf and packed-array properties
/// come before nested groups, alphabetically within each rank, and a
/// dictionary's synthetic `.id` leaf precedes the dictionary's own
/// fields.
pub fn flatten(
    schema: &SchemaNode,
    patch: Option<PatchHook<'_>>,
) -> Result<Vec<Field>, FlattenError> {
    let mut out = Vec::new();
    let root = schema.effective("")?;
    recurse(&root, "", "", true, patch, &mut out)?;
    Ok(out)
}

fn recurse(
    cur: &SchemaNode,
    base: &str,
    fq: &str,
    required: bool,
    patch: Option<PatchHook<'_>>,
    out: &mut Vec<Field>,
) -> Result<(), FlattenError> {
    if cur.is_array() {
        return Err(FlattenError::UnsupportedShape {
            path: fq.to_string(),
            reason: "an array requires an enclosing object property".to_string(),
        });
    }
    if cur.is_choice() {
        return Err(FlattenError::UnsupportedShape {
            path: fq.to_string(),
            reason: "choice alternatives must be objects or leaf values".to_string(),
        });
    }

    if cur.is_leaf() {
        return push(
            out,
            patch,
            fq,
            Field {
                name: base.to_string(),
                kind: NodeKind::Leaf,
                required,
                schema: cur.clone(),
                choices: Vec::new(),
            },
        );
    }

    if cur.is_dict() {
        // The synthetic id keys dictionary entries and must come first.
        push(
            out,
            patch,
            fq,
            Field {
                name: joined(base, "id"),
                kind: NodeKind::ListId,
                required: true,
                schema: SchemaNode::string_leaf("Unique identifier"),
                choices: Vec::new(),
            },
        )?;
        // Dictionary leaves sit at `<base>.<field>`, without an extra
        // "value" segment, so the value schema recurses at `base`.
        let value_fq = format!("{fq}{{}}");
        let value = cur
            .dict_value()
            .expect("is_dict checked above")
            .effective(&value_fq)?;
        return recurse(&value, base, &value_fq, false, patch, out);
    }

    let Some(props) = &cur.properties else {
        return Ok(());
    };

    for prop in ordered_property_keys(fq, props)? {
        let prop_name = joined(base, &prop);
        let prop_fq = joined(fq, &prop);
        let def = props[&prop].effective(&prop_fq)?;
        let prop_required = cur.requires(&prop);

        if def.is_choice() {
            let mut choices = Vec::new();
            for alternative in def.one_of.as_deref().expect("is_choice checked above") {
                let alt = alternative.effective(&prop_fq)?;
                let mut sub = Vec::new();
                recurse(&alt, &prop_name, &prop_fq, false, patch, &mut sub)?;
                choices.push(sub);
            }
            push(
                out,
                patch,
                &prop_fq,
                Field {
                    name: prop_name,
                    kind: NodeKind::Choice,
                    required: prop_required,
                    schema: def.clone(),
                    choices,
                },
            )?;
        } else if !def.is_array() {
            if !def.is_leaf() {
                let kind = if def.is_dict() {
                    NodeKind::List
                } else {
                    NodeKind::Object
                };
                push(
                    out,
                    patch,
                    &prop_fq,
                    Field {
                        name: prop_name.clone(),
                        kind,
                        required: prop_required,
                        schema: def.clone(),
                        choices: Vec::new(),
                    },
                )?;
            }
            recurse(&def, &prop_name, &prop_fq, prop_required, patch, out)?;
        } else {
            let Some(items) = &def.items else {
                return Err(FlattenError::UnsupportedShape {
                    path: prop_fq,
                    reason: "array without an `items` schema".to_string(),
                });
            };
            let items = items.effective(&prop_fq)?;
            if items.is_leaf() || items.is_array() {
                // Array of plain values: packed as a delimited string
                // inside a single cell, so the array itself is the leaf.
                push(
                    out,
                    patch,
                    &prop_fq,
                    Field {
                        name: prop_name,
                        kind: NodeKind::Leaf,
                        required: prop_required,
                        schema: def.clone(),
                        choices: Vec::new(),
                    },
                )?;
            } else {
                // Array of objects: repeated rows represent repeated
                // items, marked `[]` in the patch path.
                let arr_fq = format!("{prop_fq}[]");
                push(
                    out,
                    patch,
                    &arr_fq,
                    Field {
                        name: prop_name.clone(),
                        kind: NodeKind::List,
                        required: prop_required,
                        schema: def.clone(),
                        choices: Vec::new(),
                    },
                )?;
                recurse(&items, &prop_name, &arr_fq, prop_required, patch, out)?;
            }
        }
    }

    Ok(())
}

/// Leaf and packed-array properties first, nested groups (objects,
/// dictionaries, choices, arrays of objects) second, alphabetical
/// within each rank (`BTreeMap` iteration is sorted).
fn ordered_property_keys(
    owner_fq: &str,
    props: &BTreeMap<String, SchemaNode>,
) -> Result<Vec<String>, FlattenError> {
    let mut leaves = Vec::new();
    let mut groups = Vec::new();
    for (name, schema) in props {
        let fq = joined(owner_fq, name);
        let def = schema.effective(&fq)?;
        let single_cell = if def.is_array() {
            match &def.items {
                Some(items) => {
                    let items = items.effective(&fq)?;
                    items.is_leaf() || items.is_array()
                }
                // reported as unsupported once the property is reached
                None => true,
            }
        } else {
            def.is_leaf()
        };
        if single_cell {
            leaves.push(name.clone());
        } else {
            groups.push(name.clone());
        }
    }
    leaves.extend(groups);
    Ok(leaves)
}

fn push(
    out: &mut Vec<Field>,
    patch: Option<PatchHook<'_>>,
    fq: &str,
    field: Field,
) -> Result<(), FlattenError> {
    let Some(hook) = patch else {
        out.push(field);
        return Ok(());
    };
    let name = field.name.clone();
    let kind = field.kind;
    let patched = hook(fq, field);
    if patched.name != name || patched.kind != kind {
        return Err(FlattenError::PatchChangedIdentity {
            path: fq.to_string(),
        });
    }
    out.push(patched);
    Ok(())
}

fn joined(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{base}.{segment}")
    }
}
