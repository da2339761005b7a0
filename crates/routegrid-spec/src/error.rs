use thiserror::Error;

/// Fatal flatten-time failures.
///
/// The flattened field list is shared infrastructure for every sheet,
/// so any of these aborts the whole run rather than a single sheet.
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("unsupported schema shape at `{path}`: {reason}")]
    UnsupportedShape { path: String, reason: String },

    #[error("patch hook for `{path}` changed the field's name or kind")]
    PatchChangedIdentity { path: String },
}
