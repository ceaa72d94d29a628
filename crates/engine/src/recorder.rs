//! Show and click recording.

use rotation_core::{Rotation, RotationKey, RotationResult};
use rotation_store::RotationStore;
use std::sync::Arc;

/// Records shows and clicks against existing rotations.
///
/// Each call increments the rotation counter and appends an audit event. The
/// counter is the source of truth: if the event append fails, the increment
/// stays and the error is returned.
#[derive(Clone)]
pub struct EventRecorder {
    store: Arc<dyn RotationStore>,
}

impl EventRecorder {
    pub fn new(store: Arc<dyn RotationStore>) -> Self {
        Self { store }
    }

    pub async fn register_click(&self, key: RotationKey) -> RotationResult<Rotation> {
        let rotation = self.store.add_click(key).await?;
        metrics::counter!("rotation.clicks").increment(1);
        Ok(rotation)
    }

    pub async fn add_show(&self, key: RotationKey) -> RotationResult<Rotation> {
        let rotation = self.store.add_show(key).await?;
        metrics::counter!("rotation.shows").increment(1);
        Ok(rotation)
    }
}
