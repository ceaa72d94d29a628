#![warn(clippy::unwrap_used)]

//! Persistence for rotations, their catalogue entities and the show/click
//! audit log.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use store::RotationStore;

use rotation_core::config::{StorageBackend, StorageConfig};
use rotation_core::RotationResult;
use std::sync::Arc;

/// Create a rotation store from configuration.
pub async fn from_config(config: &StorageConfig) -> RotationResult<Arc<dyn RotationStore>> {
    match config.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory rotation store");
            Ok(Arc::new(MemoryStore::new()) as Arc<dyn RotationStore>)
        }
        StorageBackend::Postgres => {
            let store = PostgresStore::from_url(
                &config.url,
                config.max_connections,
                config.statement_timeout_ms,
            )
            .await?;
            Ok(Arc::new(store) as Arc<dyn RotationStore>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_memory() {
        let store = from_config(&StorageConfig::default()).await.unwrap();
        store.health_check().await.unwrap();
        assert_eq!(store.get_total_shows().await.unwrap(), 0);
    }
}
