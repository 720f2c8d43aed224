use crate::error::{GenerationError, Result};
use serde::{Deserialize, Serialize};

/// A validated text-to-image request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    num_images: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Result<Self> {
        Self::with_num_images(prompt, 1)
    }

    pub fn with_num_images(prompt: impl Into<String>, num_images: u32) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(GenerationError::InvalidRequest("prompt must not be empty".into()));
        }
        if num_images == 0 {
            return Err(GenerationError::InvalidRequest(
                "num_images must be at least 1".into(),
            ));
        }
        Ok(Self { prompt, num_images })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn num_images(&self) -> u32 {
        self.num_images
    }
}

/// Correlation key for a submitted remote task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskHandle {
    pub task_id: String,
}

impl TaskHandle {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
        }
    }
}

/// Image locations reported by a completed task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOutput {
    pub result_image_url: Option<String>,
    pub result_image_urls: Vec<String>,
}

impl TaskOutput {
    /// The single-image field wins; otherwise the first entry of the list.
    pub fn primary_url(&self) -> Option<&str> {
        self.result_image_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .or_else(|| {
                self.result_image_urls
                    .first()
                    .map(String::as_str)
                    .filter(|url| !url.is_empty())
            })
    }
}

/// Normalized state of a remote task, rebuilt on every status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Succeeded(TaskOutput),
    CreateFailed(Option<String>),
    GenerationFailed(Option<String>),
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageAsset {
    pub task_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub image_url: String,
    pub prompt: String,
}
