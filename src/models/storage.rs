use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const METADATA_SOURCE: &str = "nanobanana";

/// A generated image as stored by the persistence backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImageRecord {
    pub id: String,
    pub image_url: String,
    pub prompt: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

fn null_as_empty<'de, D>(
    deserializer: D,
) -> Result<HashMap<String, serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

/// Insert shape; the backend assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewImageRecord {
    pub image_url: String,
    pub prompt: String,
    pub metadata: HashMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl NewImageRecord {
    pub fn new(image_url: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            prompt: prompt.into(),
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Tags the record with generation time and source.
    pub fn with_default_metadata(mut self) -> Self {
        self.metadata.insert(
            "generated_at".to_string(),
            serde_json::json!(Utc::now().to_rfc3339()),
        );
        self.metadata
            .insert("source".to_string(), serde_json::json!(METADATA_SOURCE));
        self
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn into_record(self, id: String) -> GeneratedImageRecord {
        GeneratedImageRecord {
            id,
            image_url: self.image_url,
            prompt: self.prompt,
            metadata: self.metadata,
            created_at: self.created_at,
        }
    }
}
