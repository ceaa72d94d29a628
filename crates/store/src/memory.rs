//! In-process rotation store.
//!
//! All tables sit behind a single `RwLock`, so a deletion cascade or a
//! counter increment with its audit event is applied as one unit.

use crate::store::RotationStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rotation_core::{
    Banner, EntityKind, Event, EventType, Group, Rotation, RotationError, RotationKey,
    RotationResult, Slot,
};
use std::collections::HashMap;
use uuid::Uuid;

struct EntityRecord {
    description: String,
    deleted_at: Option<DateTime<Utc>>,
}

struct RotationRecord {
    rotation: Rotation,
    deleted_at: Option<DateTime<Utc>>,
}

impl RotationRecord {
    fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    fn references(&self, kind: EntityKind, id: Uuid) -> bool {
        match kind {
            EntityKind::Banner => self.rotation.banner_id == id,
            EntityKind::Slot => self.rotation.slot_id == id,
            EntityKind::Group => self.rotation.group_id == id,
        }
    }
}

#[derive(Default)]
struct Tables {
    banners: HashMap<Uuid, EntityRecord>,
    slots: HashMap<Uuid, EntityRecord>,
    groups: HashMap<Uuid, EntityRecord>,
    // Creation order; ids are positions + 1.
    rotations: Vec<RotationRecord>,
    events: Vec<Event>,
}

impl Tables {
    fn entities(&self, kind: EntityKind) -> &HashMap<Uuid, EntityRecord> {
        match kind {
            EntityKind::Banner => &self.banners,
            EntityKind::Slot => &self.slots,
            EntityKind::Group => &self.groups,
        }
    }

    fn entities_mut(&mut self, kind: EntityKind) -> &mut HashMap<Uuid, EntityRecord> {
        match kind {
            EntityKind::Banner => &mut self.banners,
            EntityKind::Slot => &mut self.slots,
            EntityKind::Group => &mut self.groups,
        }
    }

    fn is_live_entity(&self, kind: EntityKind, id: Uuid) -> bool {
        self.entities(kind)
            .get(&id)
            .is_some_and(|record| record.deleted_at.is_none())
    }

    fn live_rotation(&self, key: RotationKey) -> Option<usize> {
        self.rotations
            .iter()
            .position(|record| record.is_live() && record.rotation.key() == key)
    }
}

/// Rotation store that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert_entity(&self, kind: EntityKind, id: Uuid, description: &str) -> RotationResult<()> {
        let mut tables = self.tables.write();
        let entities = tables.entities_mut(kind);
        // Identifiers are never reused, deleted or not.
        if entities.contains_key(&id) {
            return Err(RotationError::AlreadyExists(format!("{kind} {id}")));
        }
        entities.insert(
            id,
            EntityRecord {
                description: description.to_string(),
                deleted_at: None,
            },
        );
        Ok(())
    }

    fn entity_description(&self, kind: EntityKind, id: Uuid) -> RotationResult<String> {
        let tables = self.tables.read();
        tables
            .entities(kind)
            .get(&id)
            .filter(|record| record.deleted_at.is_none())
            .map(|record| record.description.clone())
            .ok_or_else(|| RotationError::NotFound(format!("{kind} {id}")))
    }

    fn delete_entity(&self, kind: EntityKind, id: Uuid) -> RotationResult<()> {
        let mut tables = self.tables.write();
        let now = Utc::now();

        match tables.entities_mut(kind).get_mut(&id) {
            Some(record) if record.deleted_at.is_none() => record.deleted_at = Some(now),
            _ => return Err(RotationError::NotFound(format!("{kind} {id}"))),
        }

        let mut cascaded = 0usize;
        for record in tables
            .rotations
            .iter_mut()
            .filter(|record| record.is_live() && record.references(kind, id))
        {
            record.deleted_at = Some(now);
            record.rotation.deleted = true;
            cascaded += 1;
        }

        tracing::debug!(kind = %kind, id = %id, cascaded, "Soft-deleted entity");
        Ok(())
    }

    fn bump(&self, key: RotationKey, event_type: EventType) -> RotationResult<Rotation> {
        let mut tables = self.tables.write();
        let idx = tables
            .live_rotation(key)
            .ok_or_else(|| RotationError::NoSuchRotation(key.to_string()))?;

        let rotation = &mut tables.rotations[idx].rotation;
        match event_type {
            EventType::Show => rotation.shows += 1,
            EventType::Click => rotation.clicks += 1,
        }
        let updated = rotation.clone();

        tables.events.push(Event {
            rotation_id: updated.id,
            event_type,
            timestamp: Utc::now(),
        });
        Ok(updated)
    }
}

#[async_trait]
impl RotationStore for MemoryStore {
    async fn add_banner(&self, banner: &Banner) -> RotationResult<()> {
        self.insert_entity(EntityKind::Banner, banner.id, &banner.description)
    }

    async fn get_banner(&self, banner_id: Uuid) -> RotationResult<Banner> {
        let description = self.entity_description(EntityKind::Banner, banner_id)?;
        Ok(Banner {
            id: banner_id,
            description,
        })
    }

    async fn delete_banner(&self, banner_id: Uuid) -> RotationResult<()> {
        self.delete_entity(EntityKind::Banner, banner_id)
    }

    async fn add_slot(&self, slot: &Slot) -> RotationResult<()> {
        self.insert_entity(EntityKind::Slot, slot.id, &slot.description)
    }

    async fn get_slot(&self, slot_id: Uuid) -> RotationResult<Slot> {
        let description = self.entity_description(EntityKind::Slot, slot_id)?;
        Ok(Slot {
            id: slot_id,
            description,
        })
    }

    async fn delete_slot(&self, slot_id: Uuid) -> RotationResult<()> {
        self.delete_entity(EntityKind::Slot, slot_id)
    }

    async fn add_group(&self, group: &Group) -> RotationResult<()> {
        self.insert_entity(EntityKind::Group, group.id, &group.description)
    }

    async fn get_group(&self, group_id: Uuid) -> RotationResult<Group> {
        let description = self.entity_description(EntityKind::Group, group_id)?;
        Ok(Group {
            id: group_id,
            description,
        })
    }

    async fn delete_group(&self, group_id: Uuid) -> RotationResult<()> {
        self.delete_entity(EntityKind::Group, group_id)
    }

    async fn add_rotation(&self, key: RotationKey) -> RotationResult<Rotation> {
        let mut tables = self.tables.write();

        for (kind, id) in [
            (EntityKind::Banner, key.banner_id),
            (EntityKind::Slot, key.slot_id),
            (EntityKind::Group, key.group_id),
        ] {
            if !tables.is_live_entity(kind, id) {
                return Err(RotationError::NotFound(format!("{kind} {id}")));
            }
        }

        if tables.live_rotation(key).is_some() {
            return Err(RotationError::AlreadyExists(format!("rotation {key}")));
        }

        let rotation = Rotation {
            id: tables.rotations.len() as i64 + 1,
            banner_id: key.banner_id,
            slot_id: key.slot_id,
            group_id: key.group_id,
            shows: 0,
            clicks: 0,
            deleted: false,
        };
        tables.rotations.push(RotationRecord {
            rotation: rotation.clone(),
            deleted_at: None,
        });
        Ok(rotation)
    }

    async fn get_rotation(&self, key: RotationKey) -> RotationResult<Rotation> {
        let tables = self.tables.read();
        tables
            .live_rotation(key)
            .map(|idx| tables.rotations[idx].rotation.clone())
            .ok_or_else(|| RotationError::NotFound(format!("rotation {key}")))
    }

    async fn delete_rotation(&self, key: RotationKey) -> RotationResult<()> {
        let mut tables = self.tables.write();
        let idx = tables
            .live_rotation(key)
            .ok_or_else(|| RotationError::NoSuchRotation(key.to_string()))?;
        let record = &mut tables.rotations[idx];
        record.deleted_at = Some(Utc::now());
        record.rotation.deleted = true;
        Ok(())
    }

    async fn get_all_rotations(&self) -> RotationResult<Vec<Rotation>> {
        let tables = self.tables.read();
        Ok(tables
            .rotations
            .iter()
            .filter(|record| record.is_live())
            .map(|record| record.rotation.clone())
            .collect())
    }

    async fn get_total_shows(&self) -> RotationResult<u64> {
        let tables = self.tables.read();
        Ok(tables
            .rotations
            .iter()
            .filter(|record| record.is_live())
            .map(|record| record.rotation.shows)
            .sum())
    }

    async fn add_show(&self, key: RotationKey) -> RotationResult<Rotation> {
        self.bump(key, EventType::Show)
    }

    async fn add_click(&self, key: RotationKey) -> RotationResult<Rotation> {
        self.bump(key, EventType::Click)
    }

    async fn get_rotation_stats(&self, key: RotationKey) -> RotationResult<Vec<Event>> {
        let tables = self.tables.read();
        let idx = tables
            .live_rotation(key)
            .ok_or_else(|| RotationError::NotFound(format!("rotation {key}")))?;
        let rotation_id = tables.rotations[idx].rotation.id;
        Ok(tables
            .events
            .iter()
            .filter(|event| event.rotation_id == rotation_id)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> RotationResult<()> {
        Ok(())
    }
}
