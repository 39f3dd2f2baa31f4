use crate::error::{InsightsError, InsightsResult};
use crate::models::{AdMetricsWithImages, Recommendations};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Every key a step may read from or write to the pipeline context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextKey {
    AccountId,
    AccessToken,
    CreatorName,
    Ads,
    BrandType,
    HighPerformingPatterns,
    LowPerformingPatterns,
    Recommendations,
}

impl ContextKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextKey::AccountId => "accountId",
            ContextKey::AccessToken => "accessToken",
            ContextKey::CreatorName => "creatorName",
            ContextKey::Ads => "ads",
            ContextKey::BrandType => "brandType",
            ContextKey::HighPerformingPatterns => "highPerformingPatterns",
            ContextKey::LowPerformingPatterns => "lowPerformingPatterns",
            ContextKey::Recommendations => "recommendations",
        }
    }

    /// The kind of value this key is allowed to hold
    pub fn kind(&self) -> ValueKind {
        match self {
            ContextKey::Ads => ValueKind::Ads,
            ContextKey::Recommendations => ValueKind::Recommendations,
            _ => ValueKind::Text,
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Ads,
    Recommendations,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Text => "text",
            ValueKind::Ads => "ads",
            ValueKind::Recommendations => "recommendations",
        };
        f.write_str(name)
    }
}

/// A value stored under a [`ContextKey`]
///
/// `Null` is accepted for any key and still counts as present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Null,
    Text(String),
    Ads(Vec<AdMetricsWithImages>),
    Recommendations(Recommendations),
}

impl ContextValue {
    pub fn text(value: impl Into<String>) -> Self {
        ContextValue::Text(value.into())
    }

    /// Kind of this value, `None` for `Null`
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            ContextValue::Null => None,
            ContextValue::Text(_) => Some(ValueKind::Text),
            ContextValue::Ads(_) => Some(ValueKind::Ads),
            ContextValue::Recommendations(_) => Some(ValueKind::Recommendations),
        }
    }

    fn kind_name(&self) -> String {
        self.kind()
            .map(|kind| kind.to_string())
            .unwrap_or_else(|| "null".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextMetadata {
    pub started_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Context threaded through the workflow pipeline
///
/// The context is moved into each step and a new context comes back out.
/// Keys can be added or overwritten but never removed, so the mapping only
/// grows over a run.
///
/// # Example
/// ```
/// use creative_insights::pipeline::{ContextKey, ContextValue, PipelineContext};
///
/// let context = PipelineContext::new()
///     .with_value(ContextKey::AccountId, ContextValue::text("act_123"))
///     .unwrap();
///
/// assert_eq!(context.get_text(ContextKey::AccountId).unwrap(), "act_123");
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineContext {
    /// Run ID for this pipeline execution
    run_id: String,

    metadata: ContextMetadata,

    #[serde(flatten)]
    data: BTreeMap<ContextKey, ContextValue>,
}

impl PipelineContext {
    /// Create an empty context with a fresh run ID
    pub fn new() -> Self {
        Self::with_run_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_run_id(run_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            run_id: run_id.into(),
            metadata: ContextMetadata {
                started_at: now,
                last_updated: now,
            },
            data: BTreeMap::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn metadata(&self) -> &ContextMetadata {
        &self.metadata
    }

    /// Return a new context holding `value` under `key`
    ///
    /// Fails if the value's kind does not match the key.
    pub fn with_value(mut self, key: ContextKey, value: ContextValue) -> InsightsResult<Self> {
        if let Some(kind) = value.kind() {
            if kind != key.kind() {
                return Err(InsightsError::ContextTypeMismatch {
                    key: key.to_string(),
                    expected: key.kind().to_string(),
                    found: value.kind_name(),
                });
            }
        }
        self.data.insert(key, value);
        self.metadata.last_updated = Utc::now();
        Ok(self)
    }

    /// Shorthand for `with_value(key, ContextValue::Text(..))`
    pub fn with_text(self, key: ContextKey, value: impl Into<String>) -> InsightsResult<Self> {
        self.with_value(key, ContextValue::text(value))
    }

    pub fn get(&self, key: ContextKey) -> Option<&ContextValue> {
        self.data.get(&key)
    }

    /// Get a value from the context or return an error if not found
    pub fn get_required(&self, key: ContextKey) -> InsightsResult<&ContextValue> {
        self.data
            .get(&key)
            .ok_or_else(|| InsightsError::ContextKeyNotFound(key.to_string()))
    }

    pub fn get_text(&self, key: ContextKey) -> InsightsResult<&str> {
        match self.get_required(key)? {
            ContextValue::Text(text) => Ok(text),
            other => Err(Self::mismatch(key, ValueKind::Text, other)),
        }
    }

    /// Text under `key`, or `None` when absent or null
    pub fn get_optional_text(&self, key: ContextKey) -> Option<&str> {
        match self.data.get(&key) {
            Some(ContextValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn get_ads(&self, key: ContextKey) -> InsightsResult<&[AdMetricsWithImages]> {
        match self.get_required(key)? {
            ContextValue::Ads(ads) => Ok(ads),
            other => Err(Self::mismatch(key, ValueKind::Ads, other)),
        }
    }

    pub fn get_recommendations(&self, key: ContextKey) -> InsightsResult<&Recommendations> {
        match self.get_required(key)? {
            ContextValue::Recommendations(recs) => Ok(recs),
            other => Err(Self::mismatch(key, ValueKind::Recommendations, other)),
        }
    }

    /// Check if a key exists in the context
    pub fn has(&self, key: ContextKey) -> bool {
        self.data.contains_key(&key)
    }

    /// Keys from `keys` that are absent, in the order given
    pub fn missing_keys(&self, keys: &[ContextKey]) -> Vec<ContextKey> {
        keys.iter().copied().filter(|key| !self.has(*key)).collect()
    }

    pub fn keys(&self) -> Vec<ContextKey> {
        self.data.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn mismatch(key: ContextKey, expected: ValueKind, found: &ContextValue) -> InsightsError {
        InsightsError::ContextTypeMismatch {
            key: key.to_string(),
            expected: expected.to_string(),
            found: found.kind_name(),
        }
    }
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new()
    }
}
