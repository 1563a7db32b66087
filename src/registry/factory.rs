use crate::config::{StorageBackend, StorageConfig};
use crate::error::{LearnerError, Result};
use crate::registry::{CachedStore, InMemoryStore, LearnerStore, SledStore};
use std::sync::Arc;
use std::time::Duration;

/// Create a learner store based on configuration
pub async fn create_store(config: &StorageConfig) -> Result<Arc<dyn LearnerStore>> {
    let store: Arc<dyn LearnerStore> = match config.backend {
        StorageBackend::Memory => {
            tracing::info!("Initializing in-memory storage backend");
            Arc::new(InMemoryStore::new())
        }

        StorageBackend::Sled => {
            let path = config.path.as_ref().ok_or_else(|| {
                LearnerError::Configuration(
                    "Sled backend requires 'path' configuration".to_string(),
                )
            })?;

            tracing::info!(path = ?path, "Initializing Sled storage backend");
            Arc::new(SledStore::new(path)?)
        }
    };

    if config.cache_enabled {
        tracing::info!(
            capacity = config.cache_capacity,
            ttl_secs = config.cache_ttl_secs,
            "Enabling learner cache"
        );
        Ok(Arc::new(CachedStore::new(
            store,
            config.cache_capacity,
            Duration::from_secs(config.cache_ttl_secs),
        )))
    } else {
        Ok(store)
    }
}

/// Create an in-memory store (for testing and development)
pub fn create_in_memory_store() -> Arc<dyn LearnerStore> {
    tracing::info!("Initializing in-memory storage backend");
    Arc::new(InMemoryStore::new())
}
