use crate::{
    config::{NanoBananaConfig, PollOptions},
    error::{FailureStage, GenerationError, Result},
    logger,
    models::{
        GeneratedImage, GenerationRequest, ImageAsset, SubmitTaskBody, TaskHandle, TaskStatus,
        TEXT_TO_IMAGE,
    },
    nanobanana::api::{HttpTaskApi, TaskApi},
};
use std::{sync::Arc, time::Duration};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

/// Submits generation jobs and polls them to a terminal outcome.
///
/// Every call owns its own polling sequence; the client holds no per-task
/// state, so one instance can drive any number of tasks concurrently.
#[derive(Clone)]
pub struct GenerationTaskClient {
    api: Arc<dyn TaskApi>,
    callback_url: Option<String>,
}

impl GenerationTaskClient {
    pub fn new(config: NanoBananaConfig) -> Result<Self> {
        let callback_url = config.callback_url.clone();
        let api = HttpTaskApi::new(config)?;
        Ok(Self {
            api: Arc::new(api),
            callback_url,
        })
    }

    pub fn with_api(api: Arc<dyn TaskApi>) -> Self {
        Self {
            api,
            callback_url: None,
        }
    }

    pub fn with_callback_url(mut self, callback_url: impl Into<String>) -> Self {
        self.callback_url = Some(callback_url.into());
        self
    }

    pub async fn submit(&self, request: &GenerationRequest) -> Result<TaskHandle> {
        let body = SubmitTaskBody {
            prompt: request.prompt().to_string(),
            kind: TEXT_TO_IMAGE.to_string(),
            num_images: request.num_images(),
            call_back_url: self.callback_url.clone(),
        };

        log::info!("🚀 Submitting generation task ({} image(s))", body.num_images);
        let task_id = self.api.submit_task(&body).await.map_err(|e| {
            log::error!("❌ Task submission failed: {}", e);
            e
        })?;
        log::info!("✅ Task submitted: {}", task_id);

        Ok(TaskHandle::new(task_id))
    }

    pub async fn poll(&self, handle: &TaskHandle, options: &PollOptions) -> Result<ImageAsset> {
        self.poll_with_cancel(handle, options, &CancellationToken::new())
            .await
    }

    /// Polls until the task is terminal, the budget runs out, or `cancel`
    /// fires.
    pub async fn poll_with_cancel(
        &self,
        handle: &TaskHandle,
        options: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<ImageAsset> {
        let task_id = handle.task_id.as_str();
        let _timer = logger::task_timer(task_id);
        let started = Instant::now();

        pause(options.warm_up_delay, cancel, task_id).await?;

        let mut checks: u32 = 0;
        while started.elapsed() < options.max_wait_time {
            checks += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(cancelled(task_id)),
                outcome = self.api.fetch_status(task_id) => outcome,
            };

            match outcome {
                Ok(TaskStatus::Pending) => {
                    log::debug!("⏳ Task {} still generating (check #{})", task_id, checks);
                }
                Ok(TaskStatus::Succeeded(output)) => {
                    let url = output.primary_url().map(str::to_string).ok_or_else(|| {
                        log::error!("❌ Task {} completed without an image URL", task_id);
                        GenerationError::EmptyResult(task_id.to_string())
                    })?;
                    log::info!("✅ Task {} completed after {} check(s)", task_id, checks);
                    return Ok(ImageAsset {
                        task_id: task_id.to_string(),
                        url,
                    });
                }
                Ok(TaskStatus::CreateFailed(reason)) => {
                    return Err(task_failed(task_id, FailureStage::Creation, reason));
                }
                Ok(TaskStatus::GenerationFailed(reason)) => {
                    return Err(task_failed(task_id, FailureStage::Generation, reason));
                }
                Err(e) if e.is_transient() => {
                    log::warn!(
                        "⚠️  Error checking task {} status (will retry): {}",
                        task_id,
                        e
                    );
                }
                Err(e) => return Err(e),
            }

            pause(options.poll_interval, cancel, task_id).await?;
        }

        let waited_ms = started.elapsed().as_millis() as u64;
        log::error!(
            "❌ Task {} timed out after {}ms ({} check(s))",
            task_id,
            waited_ms,
            checks
        );
        Err(GenerationError::Timeout {
            task_id: task_id.to_string(),
            waited_ms,
        })
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
        options: &PollOptions,
    ) -> Result<GeneratedImage> {
        self.generate_with_cancel(request, options, &CancellationToken::new())
            .await
    }

    pub async fn generate_with_cancel(
        &self,
        request: &GenerationRequest,
        options: &PollOptions,
        cancel: &CancellationToken,
    ) -> Result<GeneratedImage> {
        let handle = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                log::warn!("🛑 Generation cancelled before submission");
                return Err(GenerationError::Cancelled { task_id: None });
            }
            handle = self.submit(request) => handle?,
        };
        let asset = self.poll_with_cancel(&handle, options, cancel).await?;

        Ok(GeneratedImage {
            image_url: asset.url,
            prompt: request.prompt().to_string(),
        })
    }
}

async fn pause(duration: Duration, cancel: &CancellationToken, task_id: &str) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(cancelled(task_id)),
        _ = sleep(duration) => Ok(()),
    }
}

fn cancelled(task_id: &str) -> GenerationError {
    log::warn!("🛑 Polling cancelled for task {}", task_id);
    GenerationError::Cancelled {
        task_id: Some(task_id.to_string()),
    }
}

fn task_failed(task_id: &str, stage: FailureStage, reason: Option<String>) -> GenerationError {
    let reason = reason.unwrap_or_else(|| stage.default_reason().to_string());
    log::error!("❌ Task {} {} failed: {}", task_id, stage, reason);
    GenerationError::TaskFailed { stage, reason }
}
