use crate::{
    error::Result,
    models::storage::{GeneratedImageRecord, NewImageRecord},
};
use async_trait::async_trait;

/// Record store for generated images.
#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn insert(&self, record: NewImageRecord) -> Result<GeneratedImageRecord>;

    /// Newest first.
    async fn list_recent(&self, limit: Option<usize>) -> Result<Vec<GeneratedImageRecord>>;

    async fn get(&self, id: &str) -> Result<Option<GeneratedImageRecord>>;

    async fn health_check(&self) -> Result<bool>;
}
