use crate::error::{InsightsError, InsightsResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub meta: MetaApiConfig,
    pub model: ModelConfig,
    pub analysis: AnalysisConfig,
}

/// Meta Graph API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaApiConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Backoff unit; also the upper bound of the jitter
    pub retry_base_delay_ms: u64,
}

/// Azure OpenAI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub endpoint: String,

    /// Never serialized; read from `OPENAI_API_KEY`
    #[serde(skip)]
    pub api_key: Option<String>,

    pub api_version: String,
    pub deployment: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Total attempts per request, including the first
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_secs: u64,
}

/// Tuning for the ad-ranking and prompt-building steps
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Fraction of ads considered top or bottom performers
    pub percentile: f64,
    /// Upper bound on the ranked subset
    pub limit: usize,
    /// Minimum ads required by the pattern steps
    pub min_ads: usize,
    /// Cap on image fragments per prompt
    pub max_prompt_images: usize,
    /// Ads sampled for brand classification
    pub brand_sample_size: usize,
}

impl Default for MetaApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.facebook.com/v20.0".to_string(),
            request_timeout_secs: 30,
            max_retries: 3,
            retry_base_delay_ms: 500,
        }
    }
}

impl MetaApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://fuego-ai-main.openai.azure.com/".to_string(),
            api_key: None,
            api_version: "2024-07-01-preview".to_string(),
            deployment: "gpt-4oNew".to_string(),
            max_tokens: 800,
            temperature: 0.0,
            max_attempts: 3,
            retry_delay_ms: 2000,
            request_timeout_secs: 120,
        }
    }
}

impl ModelConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            percentile: 0.2,
            limit: 30,
            min_ads: 5,
            max_prompt_images: 40,
            brand_sample_size: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from the environment, reading `.env` first if present
    pub fn from_env() -> InsightsResult<Self> {
        // A missing .env file is fine; real environment variables still apply
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> InsightsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(base_url) = lookup("META_API_BASE_URL") {
            config.meta.base_url = base_url;
        }
        if let Some(timeout) = parse_var(&lookup, "META_REQUEST_TIMEOUT_SECS")? {
            config.meta.request_timeout_secs = timeout;
        }
        if let Some(retries) = parse_var(&lookup, "META_MAX_RETRIES")? {
            config.meta.max_retries = retries;
        }
        if let Some(base) = parse_var(&lookup, "META_RETRY_BASE_DELAY_MS")? {
            config.meta.retry_base_delay_ms = base;
        }

        if let Some(endpoint) = lookup("AZURE_OPENAI_ENDPOINT") {
            config.model.endpoint = endpoint;
        }
        config.model.api_key = lookup("OPENAI_API_KEY").filter(|key| !key.is_empty());
        if let Some(version) = lookup("AZURE_OPENAI_API_VERSION") {
            config.model.api_version = version;
        }
        if let Some(deployment) = lookup("AZURE_OPENAI_DEPLOYMENT") {
            config.model.deployment = deployment;
        }
        if let Some(attempts) = parse_var(&lookup, "MODEL_MAX_ATTEMPTS")? {
            config.model.max_attempts = attempts;
        }
        if let Some(delay) = parse_var(&lookup, "MODEL_RETRY_DELAY_MS")? {
            config.model.retry_delay_ms = delay;
        }
        if let Some(timeout) = parse_var(&lookup, "MODEL_REQUEST_TIMEOUT_SECS")? {
            config.model.request_timeout_secs = timeout;
        }

        if config.model.max_attempts == 0 {
            return Err(InsightsError::ConfigError(
                "MODEL_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> InsightsResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            InsightsError::ConfigError(format!("Invalid value for {}: '{}' ({})", key, raw, e))
        }),
    }
}
