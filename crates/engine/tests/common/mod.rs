//! Test fixtures for the selection engine.
//! Note: #[allow(dead_code)] because each test file compiles common/ separately.

#![allow(dead_code)]

use async_trait::async_trait;
use rotation_core::{
    Banner, Event, Group, Rotation, RotationError, RotationKey, RotationResult, Slot,
};
use rotation_store::{MemoryStore, RotationStore};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Link `count` fresh banners into one slot and group.
pub async fn seed_rotations(store: &dyn RotationStore, count: usize) -> Vec<RotationKey> {
    let slot = Slot {
        id: Uuid::new_v4(),
        description: "sidebar".to_string(),
    };
    let group = Group {
        id: Uuid::new_v4(),
        description: "students".to_string(),
    };
    store.add_slot(&slot).await.unwrap();
    store.add_group(&group).await.unwrap();

    let mut keys = Vec::with_capacity(count);
    for i in 0..count {
        let banner = Banner {
            id: Uuid::new_v4(),
            description: format!("banner {i}"),
        };
        store.add_banner(&banner).await.unwrap();
        let key = RotationKey::new(banner.id, slot.id, group.id);
        store.add_rotation(key).await.unwrap();
        keys.push(key);
    }
    keys
}

pub async fn shows_of(store: &dyn RotationStore, key: RotationKey) -> u64 {
    store.get_rotation(key).await.unwrap().shows
}

/// Memory store wrapper that can fail reads or lose the winning rotation
/// between selection and the show write.
#[derive(Default)]
pub struct FaultyStore {
    pub inner: MemoryStore,
    pub fail_reads: AtomicBool,
    pub delete_before_show: AtomicBool,
    pub show_attempts: AtomicUsize,
    pub writes: AtomicUsize,
}

impl FaultyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn check_read(&self) -> RotationResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RotationError::StoreUnavailable(
                "connection reset".to_string(),
            ));
        }
        Ok(())
    }

    fn write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RotationStore for FaultyStore {
    async fn add_banner(&self, banner: &Banner) -> RotationResult<()> {
        self.inner.add_banner(banner).await
    }

    async fn get_banner(&self, banner_id: Uuid) -> RotationResult<Banner> {
        self.check_read()?;
        self.inner.get_banner(banner_id).await
    }

    async fn delete_banner(&self, banner_id: Uuid) -> RotationResult<()> {
        self.inner.delete_banner(banner_id).await
    }

    async fn add_slot(&self, slot: &Slot) -> RotationResult<()> {
        self.inner.add_slot(slot).await
    }

    async fn get_slot(&self, slot_id: Uuid) -> RotationResult<Slot> {
        self.check_read()?;
        self.inner.get_slot(slot_id).await
    }

    async fn delete_slot(&self, slot_id: Uuid) -> RotationResult<()> {
        self.inner.delete_slot(slot_id).await
    }

    async fn add_group(&self, group: &Group) -> RotationResult<()> {
        self.inner.add_group(group).await
    }

    async fn get_group(&self, group_id: Uuid) -> RotationResult<Group> {
        self.check_read()?;
        self.inner.get_group(group_id).await
    }

    async fn delete_group(&self, group_id: Uuid) -> RotationResult<()> {
        self.inner.delete_group(group_id).await
    }

    async fn add_rotation(&self, key: RotationKey) -> RotationResult<Rotation> {
        self.inner.add_rotation(key).await
    }

    async fn get_rotation(&self, key: RotationKey) -> RotationResult<Rotation> {
        self.check_read()?;
        self.inner.get_rotation(key).await
    }

    async fn delete_rotation(&self, key: RotationKey) -> RotationResult<()> {
        self.inner.delete_rotation(key).await
    }

    async fn get_all_rotations(&self) -> RotationResult<Vec<Rotation>> {
        self.check_read()?;
        self.inner.get_all_rotations().await
    }

    async fn get_total_shows(&self) -> RotationResult<u64> {
        self.check_read()?;
        self.inner.get_total_shows().await
    }

    async fn add_show(&self, key: RotationKey) -> RotationResult<Rotation> {
        self.show_attempts.fetch_add(1, Ordering::SeqCst);
        if self.delete_before_show.load(Ordering::SeqCst) {
            self.inner.delete_rotation(key).await?;
        }
        let result = self.inner.add_show(key).await;
        if result.is_ok() {
            self.write();
        }
        result
    }

    async fn add_click(&self, key: RotationKey) -> RotationResult<Rotation> {
        let result = self.inner.add_click(key).await;
        if result.is_ok() {
            self.write();
        }
        result
    }

    async fn get_rotation_stats(&self, key: RotationKey) -> RotationResult<Vec<Event>> {
        self.check_read()?;
        self.inner.get_rotation_stats(key).await
    }

    async fn health_check(&self) -> RotationResult<()> {
        self.check_read()
    }
}
