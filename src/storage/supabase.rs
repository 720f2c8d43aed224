use crate::{
    config::SupabaseConfig,
    error::{GenerationError, Result},
    models::storage::{GeneratedImageRecord, NewImageRecord},
    storage::traits::ImageStorage,
};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client, Response,
};
use serde_json::Value;

/// PostgREST error code for "no rows" on a single-object request.
const NO_ROWS: &str = "PGRST116";
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

pub struct SupabaseImageStorage {
    client: Client,
    table_url: String,
    headers: HeaderMap,
}

impl SupabaseImageStorage {
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        let url = config
            .url
            .ok_or_else(|| GenerationError::ConfigError("Supabase URL is required".into()))?;
        let anon_key = config
            .anon_key
            .ok_or_else(|| GenerationError::ConfigError("Supabase anon key is required".into()))?;

        Ok(Self {
            client: Client::new(),
            table_url: format!("{}/rest/v1/{}", url.trim_end_matches('/'), config.table),
            headers: Self::build_headers(&anon_key)?,
        })
    }

    fn build_headers(anon_key: &str) -> Result<HeaderMap> {
        let invalid =
            |e: reqwest::header::InvalidHeaderValue| GenerationError::ConfigError(e.to_string());

        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(anon_key).map_err(invalid)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", anon_key)).map_err(invalid)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// PostgREST error bodies look like `{ code, message, details, hint }`.
    async fn error_body(response: Response) -> (Option<String>, String) {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<Value>(&text) {
            Ok(body) => (
                body["code"].as_str().map(str::to_string),
                body["message"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            ),
            Err(_) if text.is_empty() => (None, format!("HTTP {}", status.as_u16())),
            Err(_) => (None, text),
        }
    }
}

#[async_trait]
impl ImageStorage for SupabaseImageStorage {
    async fn insert(&self, record: NewImageRecord) -> Result<GeneratedImageRecord> {
        let response = self
            .client
            .post(&self.table_url)
            .headers(self.headers.clone())
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await
            .map_err(|e| GenerationError::StorageError(format!("Failed to save image: {}", e)))?;

        if !response.status().is_success() {
            let (_, message) = Self::error_body(response).await;
            return Err(GenerationError::StorageError(format!(
                "Failed to save image: {}",
                message
            )));
        }

        let rows: Vec<GeneratedImageRecord> = response.json().await.map_err(|e| {
            GenerationError::StorageError(format!("Failed to save image: {}", e))
        })?;

        rows.into_iter().next().ok_or_else(|| {
            GenerationError::StorageError("Failed to save image: no row returned".into())
        })
    }

    async fn list_recent(&self, limit: Option<usize>) -> Result<Vec<GeneratedImageRecord>> {
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }

        let response = self
            .client
            .get(&self.table_url)
            .headers(self.headers.clone())
            .query(&query)
            .send()
            .await
            .map_err(|e| GenerationError::StorageError(format!("Failed to fetch images: {}", e)))?;

        if !response.status().is_success() {
            let (_, message) = Self::error_body(response).await;
            return Err(GenerationError::StorageError(format!(
                "Failed to fetch images: {}",
                message
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GenerationError::StorageError(format!("Failed to fetch images: {}", e)))
    }

    async fn get(&self, id: &str) -> Result<Option<GeneratedImageRecord>> {
        let response = self
            .client
            .get(&self.table_url)
            .headers(self.headers.clone())
            .header(ACCEPT, SINGLE_OBJECT)
            .query(&[("select", "*".to_string()), ("id", format!("eq.{}", id))])
            .send()
            .await
            .map_err(|e| GenerationError::StorageError(format!("Failed to fetch image: {}", e)))?;

        if !response.status().is_success() {
            let (code, message) = Self::error_body(response).await;
            if code.as_deref() == Some(NO_ROWS) {
                return Ok(None);
            }
            return Err(GenerationError::StorageError(format!(
                "Failed to fetch image: {}",
                message
            )));
        }

        let record = response
            .json()
            .await
            .map_err(|e| GenerationError::StorageError(format!("Failed to fetch image: {}", e)))?;
        Ok(Some(record))
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(&self.table_url)
            .headers(self.headers.clone())
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(e) => {
                log::warn!("⚠️  Supabase health check failed: {}", e);
                Ok(false)
            }
        }
    }
}
