//! Async client for NanoBanana text-to-image generation.
//!
//! [`GenerationTaskClient`] submits a job, then polls the status endpoint
//! until the task succeeds, fails, or the polling budget runs out.
//! [`NanoBananaClient`] adds persistence of finished images through an
//! [`ImageStorage`] backend (Supabase or in-memory).

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod nanobanana;
pub mod storage;

pub use config::{NanoBananaConfig, PollOptions, StorageConfig, SupabaseConfig};
pub use error::{FailureStage, GenerationError, Result};
pub use models::{
    GeneratedImage, GeneratedImageRecord, GenerationRequest, ImageAsset, NewImageRecord,
    TaskHandle, TaskOutput, TaskStatus,
};
pub use nanobanana::{
    GenerationOutcome, GenerationTaskClient, HttpTaskApi, NanoBananaClient, TaskApi,
};
pub use storage::{ImageStorage, ImageStorageManager, MemoryImageStorage, SupabaseImageStorage};
pub use tokio_util::sync::CancellationToken;
