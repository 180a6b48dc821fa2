use crate::config::{StoreBackend, StoreConfig};
use crate::error::{AppError, Result};
use crate::state::{InMemoryStore, ReadingStore, SledStore};
use std::sync::Arc;

/// Create a reading store based on configuration
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn ReadingStore>> {
    match config.backend {
        StoreBackend::Sled => {
            let path = config.path.as_ref().ok_or_else(|| {
                AppError::Configuration("Sled backend requires 'path' configuration".to_string())
            })?;

            tracing::info!(
                path = ?path,
                database = %config.database,
                collection = %config.collection,
                "Initializing Sled storage backend"
            );

            let store = SledStore::new(path.join(&config.database), &config.collection)?;
            Ok(Arc::new(store))
        }

        StoreBackend::Memory => Ok(create_in_memory_store()),
    }
}

/// Create an in-memory store (for testing and development)
pub fn create_in_memory_store() -> Arc<dyn ReadingStore> {
    tracing::info!("Initializing in-memory storage backend");
    Arc::new(InMemoryStore::new())
}
