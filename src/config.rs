use crate::error::{GenerationError, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.nanobananaapi.ai/api/v1/nanobanana";
pub const DEFAULT_TABLE: &str = "generated_images";

const DEFAULT_MAX_WAIT_MS: u64 = 300_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;
const DEFAULT_WARM_UP_MS: u64 = 2_000;

fn lookup_first<F>(lookup: &F, keys: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .filter_map(|key| lookup(*key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn lookup_millis<F>(lookup: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Credentials and endpoint for the NanoBanana job API.
#[derive(Debug, Clone)]
pub struct NanoBananaConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub callback_url: Option<String>,
    pub poll: PollOptions,
}

impl Default for NanoBananaConfig {
    fn default() -> Self {
        NanoBananaConfig {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            callback_url: None,
            poll: PollOptions::default(),
        }
    }
}

impl NanoBananaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        NanoBananaConfig {
            api_key: lookup_first(&lookup, &["NANOBANANA_API_KEY", "VITE_NANOBANANA_API_KEY"]),
            base_url: lookup_first(&lookup, &["NANOBANANA_BASE_URL"])
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            callback_url: lookup_first(&lookup, &["NANOBANANA_CALLBACK_URL"]),
            poll: PollOptions::from_lookup(&lookup),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_callback_url(mut self, callback_url: impl Into<String>) -> Self {
        self.callback_url = Some(callback_url.into());
        self
    }

    pub fn with_poll_options(mut self, poll: PollOptions) -> Self {
        self.poll = poll;
        self
    }

    /// Returns the API key, or a `ConfigError` if it was never provided.
    pub fn validate(&self) -> Result<&str> {
        let key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                GenerationError::ConfigError(
                    "NANOBANANA_API_KEY is not set. Add it to your environment or .env file."
                        .into(),
                )
            })?;

        if self.base_url.trim().is_empty() {
            return Err(GenerationError::ConfigError(
                "NanoBanana base URL is empty".into(),
            ));
        }

        Ok(key)
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Timing budget for one polling sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub max_wait_time: Duration,
    pub poll_interval: Duration,
    pub warm_up_delay: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        PollOptions {
            max_wait_time: Duration::from_millis(DEFAULT_MAX_WAIT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            warm_up_delay: Duration::from_millis(DEFAULT_WARM_UP_MS),
        }
    }
}

impl PollOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        PollOptions {
            max_wait_time: lookup_millis(lookup, "NANOBANANA_MAX_WAIT_MS")
                .unwrap_or(defaults.max_wait_time),
            poll_interval: lookup_millis(lookup, "NANOBANANA_POLL_INTERVAL_MS")
                .unwrap_or(defaults.poll_interval),
            warm_up_delay: lookup_millis(lookup, "NANOBANANA_WARM_UP_MS")
                .unwrap_or(defaults.warm_up_delay),
        }
    }

    pub fn with_max_wait_time(mut self, max_wait_time: Duration) -> Self {
        self.max_wait_time = max_wait_time;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_warm_up_delay(mut self, warm_up_delay: Duration) -> Self {
        self.warm_up_delay = warm_up_delay;
        self
    }
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub table: String,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        SupabaseConfig {
            url: None,
            anon_key: None,
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl SupabaseConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        SupabaseConfig {
            url: lookup_first(lookup, &["SUPABASE_URL", "VITE_SUPABASE_URL"]),
            anon_key: lookup_first(lookup, &["SUPABASE_ANON_KEY", "VITE_SUPABASE_ANON_KEY"]),
            table: lookup_first(lookup, &["SUPABASE_TABLE"])
                .unwrap_or_else(|| DEFAULT_TABLE.to_string()),
        }
    }

    pub fn with_credentials(mut self, url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self.anon_key = Some(anon_key.into());
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }
}

/// Selects the persistence backend for generated images.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub use_supabase: bool,
    pub supabase: Option<SupabaseConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            use_supabase: false,
            supabase: None,
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// In-process storage only.
    pub fn memory() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let supabase = SupabaseConfig::from_lookup(&lookup);
        let explicit = lookup("USE_SUPABASE").map(|val| val.trim() == "true");
        let use_supabase = explicit.unwrap_or(supabase.url.is_some() && supabase.anon_key.is_some());

        StorageConfig {
            use_supabase,
            supabase: Some(supabase),
        }
    }

    pub fn with_supabase(mut self, config: SupabaseConfig) -> Self {
        self.supabase = Some(config);
        self.use_supabase = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_fails_fast() {
        let config = NanoBananaConfig::from_lookup(vars(&[]));
        let err = config.validate().unwrap_err();
        assert!(matches!(err, GenerationError::ConfigError(_)));

        let blank = NanoBananaConfig::new().with_api_key("   ");
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_vite_prefixed_key_is_accepted() {
        let config = NanoBananaConfig::from_lookup(vars(&[("VITE_NANOBANANA_API_KEY", "k-123")]));
        assert_eq!(config.validate().unwrap(), "k-123");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_poll_defaults_and_overrides() {
        let defaults = PollOptions::default();
        assert_eq!(defaults.max_wait_time, Duration::from_millis(300_000));
        assert_eq!(defaults.poll_interval, Duration::from_millis(3_000));
        assert_eq!(defaults.warm_up_delay, Duration::from_millis(2_000));

        let config = NanoBananaConfig::from_lookup(vars(&[
            ("NANOBANANA_MAX_WAIT_MS", "10000"),
            ("NANOBANANA_POLL_INTERVAL_MS", "not-a-number"),
        ]));
        assert_eq!(config.poll.max_wait_time, Duration::from_millis(10_000));
        assert_eq!(config.poll.poll_interval, Duration::from_millis(3_000));
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = NanoBananaConfig::new().with_base_url("http://localhost:9000/api/");
        assert_eq!(config.endpoint("generate"), "http://localhost:9000/api/generate");
    }

    #[test]
    fn test_storage_enabled_when_supabase_credentials_present() {
        let config = StorageConfig::from_lookup(vars(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
        ]));
        assert!(config.use_supabase);
        assert_eq!(config.supabase.unwrap().table, DEFAULT_TABLE);

        let disabled = StorageConfig::from_lookup(vars(&[
            ("SUPABASE_URL", "https://x.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("USE_SUPABASE", "false"),
        ]));
        assert!(!disabled.use_supabase);
    }
}
