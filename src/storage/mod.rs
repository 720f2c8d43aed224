pub mod memory;
pub mod supabase;
pub mod traits;

use crate::{
    config::StorageConfig,
    error::{GenerationError, Result},
    models::storage::{GeneratedImageRecord, NewImageRecord},
};
use std::sync::Arc;

pub use memory::MemoryImageStorage;
pub use supabase::SupabaseImageStorage;
pub use traits::ImageStorage;

pub struct ImageStorageManager {
    backend: Arc<dyn ImageStorage>,
}

impl ImageStorageManager {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let backend: Arc<dyn ImageStorage> = if config.use_supabase {
            let supabase_config = config.supabase.ok_or_else(|| {
                GenerationError::ConfigError("Supabase config required".into())
            })?;
            log::info!("🗄️  Using Supabase table '{}'", supabase_config.table);
            Arc::new(SupabaseImageStorage::new(supabase_config)?)
        } else {
            log::info!("🗄️  Using in-memory image storage");
            Arc::new(MemoryImageStorage::new())
        };

        Ok(Self { backend })
    }

    pub fn with_backend(backend: Arc<dyn ImageStorage>) -> Self {
        Self { backend }
    }

    pub fn storage(&self) -> &Arc<dyn ImageStorage> {
        &self.backend
    }

    pub async fn insert(&self, record: NewImageRecord) -> Result<GeneratedImageRecord> {
        self.backend.insert(record).await
    }

    pub async fn list_recent(&self, limit: Option<usize>) -> Result<Vec<GeneratedImageRecord>> {
        self.backend.list_recent(limit).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<GeneratedImageRecord>> {
        self.backend.get(id).await
    }

    pub async fn health_check(&self) -> Result<bool> {
        self.backend.health_check().await
    }
}
