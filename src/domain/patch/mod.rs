//! Patch diff engine
//!
//! Pure, deterministic edit scripts between two snapshots of a record.
//! Applying `diff(before, after)` to `before` reconstructs `after`.

mod apply;
mod diff;
mod operation;

pub use apply::{apply, PatchError};
pub use diff::diff;
pub use operation::{pointer_join, pointer_tokens, PatchOperation};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::DomainError;

/// Diff two typed records through their serialized form
pub fn diff_entities<T: Serialize>(
    before: &T,
    after: &T,
) -> Result<Vec<PatchOperation>, DomainError> {
    let before = serde_json::to_value(before).map_err(|e| DomainError::internal(e.to_string()))?;
    let after = serde_json::to_value(after).map_err(|e| DomainError::internal(e.to_string()))?;

    Ok(diff(&before, &after))
}

/// Apply operations to a typed record, returning the patched copy
pub fn apply_to_entity<T>(entity: &T, ops: &[PatchOperation]) -> Result<T, DomainError>
where
    T: Serialize + DeserializeOwned,
{
    let mut document =
        serde_json::to_value(entity).map_err(|e| DomainError::internal(e.to_string()))?;

    apply(&mut document, ops).map_err(|e| DomainError::patch(e.to_string()))?;

    serde_json::from_value(document).map_err(|e| DomainError::patch(e.to_string()))
}
