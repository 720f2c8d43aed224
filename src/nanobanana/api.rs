use crate::{
    config::NanoBananaConfig,
    error::{GenerationError, Result},
    models::{SubmitTaskBody, SubmitTaskResponse, TaskStatus, SUCCESS_CODE},
    nanobanana::normalize::{error_message, normalize_status},
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, StatusCode,
};
use serde_json::Value;

const SUBMIT_FALLBACK_MESSAGE: &str = "Failed to submit image generation task";

/// The remote job API as seen by the task client.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Submits a job and returns the remote task id.
    async fn submit_task(&self, body: &SubmitTaskBody) -> Result<String>;

    /// One status check, normalized. Transient failures come back as
    /// `TransportError`.
    async fn fetch_status(&self, task_id: &str) -> Result<TaskStatus>;
}

#[derive(Clone)]
pub struct HttpTaskApi {
    client: Client,
    config: NanoBananaConfig,
    headers: HeaderMap,
}

impl HttpTaskApi {
    pub fn new(config: NanoBananaConfig) -> Result<Self> {
        let api_key = config.validate()?;
        let headers = Self::build_headers(api_key)?;

        Ok(Self {
            client: Client::new(),
            config,
            headers,
        })
    }

    fn build_headers(api_key: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
            GenerationError::ConfigError(format!("API key is not a valid header value: {}", e))
        })?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub fn config(&self) -> &NanoBananaConfig {
        &self.config
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn submit_task(&self, body: &SubmitTaskBody) -> Result<String> {
        let response = self
            .client
            .post(self.config.endpoint("generate"))
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::SubmissionError(e.to_string()))?;

        let http_ok = response.status().is_success();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::SubmissionError(e.to_string()))?;
        log::debug!("Submit response: {}", text);

        let parsed: Option<SubmitTaskResponse> = serde_json::from_str(&text).ok();
        let message = parsed
            .as_ref()
            .and_then(|r| r.msg.clone())
            .filter(|m| !m.is_empty());

        let task_id = parsed
            .as_ref()
            .filter(|r| http_ok && r.code == Some(SUCCESS_CODE))
            .and_then(|r| r.data.as_ref())
            .and_then(|d| d.task_id.clone())
            .filter(|id| !id.is_empty());

        task_id.ok_or_else(|| {
            GenerationError::SubmissionError(
                message.unwrap_or_else(|| SUBMIT_FALLBACK_MESSAGE.to_string()),
            )
        })
    }

    async fn fetch_status(&self, task_id: &str) -> Result<TaskStatus> {
        let response = self
            .client
            .get(self.config.endpoint("record-info"))
            .headers(self.headers.clone())
            .query(&[("taskId", task_id)])
            .send()
            .await
            .map_err(|e| GenerationError::TransportError(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::TransportError(e.to_string()))?;

        log::debug!(
            "Status check for task {}: HTTP {} {}",
            task_id,
            status.as_u16(),
            text
        );

        if !status.is_success() {
            // The task may not be registered yet.
            if status == StatusCode::NOT_FOUND || status == StatusCode::INTERNAL_SERVER_ERROR {
                return Ok(TaskStatus::Pending);
            }

            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| error_message(&body))
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                });
            return Err(GenerationError::TransportError(format!(
                "HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }

        let payload: Value = serde_json::from_str(&text).map_err(|e| {
            GenerationError::TransportError(format!("invalid status payload: {}", e))
        })?;

        normalize_status(&payload)
    }
}
