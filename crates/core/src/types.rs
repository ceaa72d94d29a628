use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// A creative that can be rotated through slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Banner {
    pub id: Uuid,
    pub description: String,
}

/// A display position on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Slot {
    pub id: Uuid,
    pub description: String,
}

/// An audience segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Group {
    pub id: Uuid,
    pub description: String,
}

/// The three catalogue entities a rotation links together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Banner,
    Slot,
    Group,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Banner => "banner",
            Self::Slot => "slot",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Natural key of a rotation: one banner shown in one slot to one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RotationKey {
    pub banner_id: Uuid,
    pub slot_id: Uuid,
    pub group_id: Uuid,
}

impl RotationKey {
    pub fn new(banner_id: Uuid, slot_id: Uuid, group_id: Uuid) -> Self {
        Self {
            banner_id,
            slot_id,
            group_id,
        }
    }
}

impl fmt::Display for RotationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "banner={} slot={} group={}",
            self.banner_id, self.slot_id, self.group_id
        )
    }
}

/// Show/click history of one banner in one slot for one group.
///
/// `clicks <= shows` is expected but not enforced: clicks are reported by
/// clients independently of the selection path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Rotation {
    pub id: i64,
    pub banner_id: Uuid,
    pub slot_id: Uuid,
    pub group_id: Uuid,
    pub shows: u64,
    pub clicks: u64,
    #[serde(default)]
    pub deleted: bool,
}

impl Rotation {
    pub fn key(&self) -> RotationKey {
        RotationKey::new(self.banner_id, self.slot_id, self.group_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Show,
    Click,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::Click => "click",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "show" => Some(Self::Show),
            "click" => Some(Self::Click),
            _ => None,
        }
    }
}

/// Append-only audit record of a single show or click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Event {
    pub rotation_id: i64,
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_wire_format() {
        assert_eq!(serde_json::to_string(&EventType::Show).unwrap(), "\"show\"");
        assert_eq!(EventType::parse("click"), Some(EventType::Click));
        assert_eq!(EventType::parse("CLICK"), None);
    }

    #[test]
    fn test_rotation_key_matches_fields() {
        let rotation = Rotation {
            id: 7,
            banner_id: Uuid::new_v4(),
            slot_id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            shows: 3,
            clicks: 1,
            deleted: false,
        };
        let key = rotation.key();
        assert_eq!(key.banner_id, rotation.banner_id);
        assert_eq!(key.slot_id, rotation.slot_id);
        assert_eq!(key.group_id, rotation.group_id);
    }
}
