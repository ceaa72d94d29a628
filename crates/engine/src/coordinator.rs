//! Serving a banner: load statistics, score, persist the show.

use crate::recorder::EventRecorder;
use crate::ucb1;
use rotation_core::config::SelectionScope;
use rotation_core::{Rotation, RotationResult};
use rotation_store::RotationStore;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Chooses which banner to show and records the show.
///
/// Holds no state between calls. Concurrent calls may read the same
/// statistics and pick the same rotation; both shows are counted and the
/// policy absorbs the skew, so no lock spans the read and the write.
#[derive(Clone)]
pub struct RotationCoordinator {
    store: Arc<dyn RotationStore>,
    recorder: EventRecorder,
    scope: SelectionScope,
}

impl RotationCoordinator {
    pub fn new(store: Arc<dyn RotationStore>, scope: SelectionScope) -> Self {
        Self {
            recorder: EventRecorder::new(store.clone()),
            store,
            scope,
        }
    }

    pub fn scope(&self) -> SelectionScope {
        self.scope
    }

    /// Pick a rotation for `slot_id`/`group_id`, count one show for it and
    /// return it with the incremented show count.
    ///
    /// Read failures return before anything is written. The show is recorded
    /// against the winner's own key, which under `SelectionScope::Global`
    /// need not match the requested slot and group.
    pub async fn choose_banner(&self, slot_id: Uuid, group_id: Uuid) -> RotationResult<Rotation> {
        let (candidates, trials) = self.load_candidates(slot_id, group_id).await?;

        let winner = ucb1::select(&candidates, trials)?;
        debug!(
            banner_id = %winner.banner_id,
            slot_id = %winner.slot_id,
            group_id = %winner.group_id,
            shows = winner.shows,
            clicks = winner.clicks,
            trials,
            candidates = candidates.len(),
            "Rotation selected"
        );

        self.recorder.add_show(winner.key()).await
    }

    async fn load_candidates(
        &self,
        slot_id: Uuid,
        group_id: Uuid,
    ) -> RotationResult<(Vec<Rotation>, u64)> {
        match self.scope {
            SelectionScope::Global => {
                let trials = self.store.get_total_shows().await?;
                let candidates = self.store.get_all_rotations().await?;
                Ok((candidates, trials))
            }
            SelectionScope::SlotGroup => {
                let candidates: Vec<Rotation> = self
                    .store
                    .get_all_rotations()
                    .await?
                    .into_iter()
                    .filter(|r| r.slot_id == slot_id && r.group_id == group_id)
                    .collect();
                let trials = candidates.iter().map(|r| r.shows).sum();
                Ok((candidates, trials))
            }
        }
    }
}
