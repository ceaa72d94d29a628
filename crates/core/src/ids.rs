//! Identifier parsing at the API boundary.

use crate::error::{RotationError, RotationResult};
use crate::types::{EntityKind, RotationKey};
use uuid::Uuid;

/// Parse a textual identifier of the given entity kind.
///
/// Fails with `Validation` without touching any store.
pub fn parse_id(kind: EntityKind, raw: &str) -> RotationResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|e| RotationError::Validation(format!("failed to parse {kind} uuid: {e}")))
}

pub fn parse_rotation_key(banner: &str, slot: &str, group: &str) -> RotationResult<RotationKey> {
    Ok(RotationKey::new(
        parse_id(EntityKind::Banner, banner)?,
        parse_id(EntityKind::Slot, slot)?,
        parse_id(EntityKind::Group, group)?,
    ))
}
