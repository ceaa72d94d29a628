//! Rotation store capability trait.

use async_trait::async_trait;
use rotation_core::{Banner, Event, Group, Rotation, RotationKey, RotationResult, Slot};
use uuid::Uuid;

/// Storage operations consumed by the selection engine and the API.
///
/// Every read path skips soft-deleted rows. Deleting a banner, slot or group
/// soft-deletes it together with every rotation that references it, as one
/// atomic unit.
#[async_trait]
pub trait RotationStore: Send + Sync {
    async fn add_banner(&self, banner: &Banner) -> RotationResult<()>;
    async fn get_banner(&self, banner_id: Uuid) -> RotationResult<Banner>;
    async fn delete_banner(&self, banner_id: Uuid) -> RotationResult<()>;

    async fn add_slot(&self, slot: &Slot) -> RotationResult<()>;
    async fn get_slot(&self, slot_id: Uuid) -> RotationResult<Slot>;
    async fn delete_slot(&self, slot_id: Uuid) -> RotationResult<()>;

    async fn add_group(&self, group: &Group) -> RotationResult<()>;
    async fn get_group(&self, group_id: Uuid) -> RotationResult<Group>;
    async fn delete_group(&self, group_id: Uuid) -> RotationResult<()>;

    /// Link an existing banner, slot and group. The new rotation starts with
    /// no shows and no clicks.
    async fn add_rotation(&self, key: RotationKey) -> RotationResult<Rotation>;

    async fn get_rotation(&self, key: RotationKey) -> RotationResult<Rotation>;

    async fn delete_rotation(&self, key: RotationKey) -> RotationResult<()>;

    /// All non-deleted rotations, in creation order.
    async fn get_all_rotations(&self) -> RotationResult<Vec<Rotation>>;

    /// Sum of shows over all non-deleted rotations.
    async fn get_total_shows(&self) -> RotationResult<u64>;

    /// Increment the show counter and append a show event. Returns the
    /// rotation after the increment.
    async fn add_show(&self, key: RotationKey) -> RotationResult<Rotation>;

    /// Increment the click counter and append a click event. Returns the
    /// rotation after the increment.
    async fn add_click(&self, key: RotationKey) -> RotationResult<Rotation>;

    /// Audit log of one rotation in chronological order.
    async fn get_rotation_stats(&self, key: RotationKey) -> RotationResult<Vec<Event>>;

    async fn health_check(&self) -> RotationResult<()>;
}
