pub mod api;
pub mod normalize;
pub mod task_client;

use crate::{
    config::{NanoBananaConfig, PollOptions, StorageConfig},
    error::{GenerationError, Result},
    models::{GeneratedImage, GeneratedImageRecord, GenerationRequest, NewImageRecord},
    storage::ImageStorageManager,
};
use futures::future::join_all;
use std::sync::Arc;

pub use api::{HttpTaskApi, TaskApi};
pub use task_client::GenerationTaskClient;

/// A finished generation and what happened when saving it.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub image: GeneratedImage,
    pub record: Option<GeneratedImageRecord>,
    pub save_error: Option<String>,
}

impl GenerationOutcome {
    pub fn is_saved(&self) -> bool {
        self.record.is_some()
    }
}

#[derive(Clone)]
pub struct NanoBananaClient {
    tasks: GenerationTaskClient,
    poll: PollOptions,
    storage: Option<Arc<ImageStorageManager>>,
}

impl NanoBananaClient {
    pub fn new(config: NanoBananaConfig) -> Result<Self> {
        let poll = config.poll;
        Ok(Self {
            tasks: GenerationTaskClient::new(config)?,
            poll,
            storage: None,
        })
    }

    pub fn with_storage(config: NanoBananaConfig, storage_config: StorageConfig) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.storage = Some(Arc::new(ImageStorageManager::new(storage_config)?));
        Ok(client)
    }

    pub fn from_parts(
        tasks: GenerationTaskClient,
        poll: PollOptions,
        storage: Option<Arc<ImageStorageManager>>,
    ) -> Self {
        Self {
            tasks,
            poll,
            storage,
        }
    }

    pub fn tasks(&self) -> &GenerationTaskClient {
        &self.tasks
    }

    pub fn poll_options(&self) -> &PollOptions {
        &self.poll
    }

    pub fn storage(&self) -> Option<&Arc<ImageStorageManager>> {
        self.storage.as_ref()
    }

    pub async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        let request = GenerationRequest::new(prompt)?;
        self.tasks.generate(&request, &self.poll).await
    }

    /// Generates an image and saves it; a failed save is reported in the
    /// outcome rather than failing the generation.
    pub async fn generate_and_store(&self, prompt: &str) -> Result<GenerationOutcome> {
        let image = self.generate(prompt).await?;

        let Some(storage) = &self.storage else {
            return Ok(GenerationOutcome {
                image,
                record: None,
                save_error: None,
            });
        };

        let new_record =
            NewImageRecord::new(image.image_url.clone(), image.prompt.clone()).with_default_metadata();

        match storage.insert(new_record).await {
            Ok(record) => {
                log::info!("💾 Image saved with id {}", record.id);
                Ok(GenerationOutcome {
                    image,
                    record: Some(record),
                    save_error: None,
                })
            }
            Err(e) => {
                log::error!("❌ Image generated but save failed: {}", e);
                Ok(GenerationOutcome {
                    image,
                    record: None,
                    save_error: Some(e.to_string()),
                })
            }
        }
    }

    /// Runs one independent sequence per prompt; results keep input order.
    pub async fn generate_many(&self, prompts: &[&str]) -> Vec<Result<GenerationOutcome>> {
        join_all(prompts.iter().map(|prompt| self.generate_and_store(prompt))).await
    }

    pub async fn recent_images(&self) -> Result<Vec<GeneratedImageRecord>> {
        self.require_storage()?.list_recent(None).await
    }

    pub async fn image_by_id(&self, id: &str) -> Result<Option<GeneratedImageRecord>> {
        self.require_storage()?.get(id).await
    }

    fn require_storage(&self) -> Result<&Arc<ImageStorageManager>> {
        self.storage
            .as_ref()
            .ok_or_else(|| GenerationError::ConfigError("No storage backend configured".into()))
    }
}
