//! Operations exposed to the HTTP layer.
//!
//! Thin pass-throughs to the store, coordinator and recorder that generate
//! identifiers, log failures and count entity changes.

use crate::coordinator::RotationCoordinator;
use crate::recorder::EventRecorder;
use rotation_core::config::SelectionScope;
use rotation_core::{
    Banner, EntityKind, Event, Group, Rotation, RotationError, RotationKey, RotationResult, Slot,
};
use rotation_store::RotationStore;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Log a failed operation. Lookups that miss are expected traffic and go
/// out at warn; anything else is an error.
fn report(operation: &str, err: &RotationError) {
    if err.is_not_found() || matches!(err, RotationError::Validation(_)) {
        warn!(error = %err, operation, "Rotation operation rejected");
    } else {
        error!(error = %err, operation, "Rotation operation failed");
    }
}

#[derive(Clone)]
pub struct RotationService {
    store: Arc<dyn RotationStore>,
    coordinator: RotationCoordinator,
    recorder: EventRecorder,
}

impl RotationService {
    pub fn new(store: Arc<dyn RotationStore>, scope: SelectionScope) -> Self {
        Self {
            coordinator: RotationCoordinator::new(store.clone(), scope),
            recorder: EventRecorder::new(store.clone()),
            store,
        }
    }

    fn created(kind: EntityKind, id: Uuid) {
        metrics::counter!("rotation.entities.created", "kind" => kind.as_str()).increment(1);
        debug!(kind = %kind, id = %id, "Entity created");
    }

    fn deleted(kind: EntityKind, id: Uuid) {
        metrics::counter!("rotation.entities.deleted", "kind" => kind.as_str()).increment(1);
        debug!(kind = %kind, id = %id, "Entity deleted");
    }

    // ─── Banners ────────────────────────────────────────────────────────

    pub async fn add_banner(&self, description: &str) -> RotationResult<Banner> {
        let banner = Banner {
            id: Uuid::new_v4(),
            description: description.to_string(),
        };
        self.store
            .add_banner(&banner)
            .await
            .inspect_err(|e| report("add_banner", e))?;
        Self::created(EntityKind::Banner, banner.id);
        Ok(banner)
    }

    pub async fn get_banner(&self, banner_id: Uuid) -> RotationResult<Banner> {
        self.store
            .get_banner(banner_id)
            .await
            .inspect_err(|e| report("get_banner", e))
    }

    pub async fn delete_banner(&self, banner_id: Uuid) -> RotationResult<()> {
        self.store
            .delete_banner(banner_id)
            .await
            .inspect_err(|e| report("delete_banner", e))?;
        Self::deleted(EntityKind::Banner, banner_id);
        Ok(())
    }

    // ─── Slots ──────────────────────────────────────────────────────────

    pub async fn add_slot(&self, description: &str) -> RotationResult<Slot> {
        let slot = Slot {
            id: Uuid::new_v4(),
            description: description.to_string(),
        };
        self.store
            .add_slot(&slot)
            .await
            .inspect_err(|e| report("add_slot", e))?;
        Self::created(EntityKind::Slot, slot.id);
        Ok(slot)
    }

    pub async fn get_slot(&self, slot_id: Uuid) -> RotationResult<Slot> {
        self.store
            .get_slot(slot_id)
            .await
            .inspect_err(|e| report("get_slot", e))
    }

    pub async fn delete_slot(&self, slot_id: Uuid) -> RotationResult<()> {
        self.store
            .delete_slot(slot_id)
            .await
            .inspect_err(|e| report("delete_slot", e))?;
        Self::deleted(EntityKind::Slot, slot_id);
        Ok(())
    }

    // ─── Groups ─────────────────────────────────────────────────────────

    pub async fn add_group(&self, description: &str) -> RotationResult<Group> {
        let group = Group {
            id: Uuid::new_v4(),
            description: description.to_string(),
        };
        self.store
            .add_group(&group)
            .await
            .inspect_err(|e| report("add_group", e))?;
        Self::created(EntityKind::Group, group.id);
        Ok(group)
    }

    pub async fn get_group(&self, group_id: Uuid) -> RotationResult<Group> {
        self.store
            .get_group(group_id)
            .await
            .inspect_err(|e| report("get_group", e))
    }

    pub async fn delete_group(&self, group_id: Uuid) -> RotationResult<()> {
        self.store
            .delete_group(group_id)
            .await
            .inspect_err(|e| report("delete_group", e))?;
        Self::deleted(EntityKind::Group, group_id);
        Ok(())
    }

    // ─── Rotations ──────────────────────────────────────────────────────

    pub async fn add_rotation(&self, key: RotationKey) -> RotationResult<Rotation> {
        let rotation = self
            .store
            .add_rotation(key)
            .await
            .inspect_err(|e| report("add_rotation", e))?;
        debug!(rotation_id = rotation.id, key = %key, "Rotation created");
        Ok(rotation)
    }

    pub async fn get_rotation(&self, key: RotationKey) -> RotationResult<Rotation> {
        self.store
            .get_rotation(key)
            .await
            .inspect_err(|e| report("get_rotation", e))
    }

    pub async fn delete_rotation(&self, key: RotationKey) -> RotationResult<()> {
        self.store
            .delete_rotation(key)
            .await
            .inspect_err(|e| report("delete_rotation", e))
    }

    pub async fn register_click(&self, key: RotationKey) -> RotationResult<Rotation> {
        self.recorder
            .register_click(key)
            .await
            .inspect_err(|e| report("register_click", e))
    }

    pub async fn get_stats(&self, key: RotationKey) -> RotationResult<Vec<Event>> {
        self.store
            .get_rotation_stats(key)
            .await
            .inspect_err(|e| report("get_stats", e))
    }

    pub async fn choose_banner(&self, slot_id: Uuid, group_id: Uuid) -> RotationResult<Rotation> {
        debug!(slot_id = %slot_id, group_id = %group_id, "Choose banner");
        match self.coordinator.choose_banner(slot_id, group_id).await {
            Ok(rotation) => {
                metrics::counter!("rotation.choose").increment(1);
                Ok(rotation)
            }
            Err(e) => {
                metrics::counter!("rotation.choose.errors").increment(1);
                report("choose_banner", &e);
                Err(e)
            }
        }
    }

    pub async fn health_check(&self) -> RotationResult<()> {
        self.store.health_check().await
    }
}
