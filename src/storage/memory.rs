use crate::{
    error::Result,
    models::storage::{GeneratedImageRecord, NewImageRecord},
    storage::traits::ImageStorage,
};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Session-local store used when no hosted backend is configured.
#[derive(Default)]
pub struct MemoryImageStorage {
    records: RwLock<Vec<GeneratedImageRecord>>,
}

impl MemoryImageStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageStorage for MemoryImageStorage {
    async fn insert(&self, record: NewImageRecord) -> Result<GeneratedImageRecord> {
        let record = record.into_record(Uuid::new_v4().to_string());
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn list_recent(&self, limit: Option<usize>) -> Result<Vec<GeneratedImageRecord>> {
        let mut records = self.records.read().await.clone();
        // Stable sort keeps later inserts first among equal timestamps.
        records.reverse();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn get(&self, id: &str) -> Result<Option<GeneratedImageRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|record| record.id == id)
            .cloned())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
