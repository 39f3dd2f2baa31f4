use thiserror::Error;

/// Central error type for the creative insights pipeline
#[derive(Error, Debug)]
pub enum InsightsError {
    // ============================================================================
    // Pipeline Errors
    // ============================================================================
    #[error("Missing required keys in context for step '{step}': {}", .missing.join(", "))]
    MissingRequiredKeys { step: String, missing: Vec<String> },

    #[error("Precondition failed for step '{step}': {reason}")]
    PreconditionFailed { step: String, reason: String },

    #[error("Step '{step}' requires '{key}' but neither the initial context nor an earlier step provides it")]
    UnsatisfiedDependency { step: String, key: String },

    #[error("Required context key not found: {0}")]
    ContextKeyNotFound(String),

    #[error("Context key '{key}' holds {expected} values, got {found}")]
    ContextTypeMismatch {
        key: String,
        expected: String,
        found: String,
    },

    // ============================================================================
    // Meta Graph API Errors
    // ============================================================================
    #[error("Meta API request failed: {0}")]
    MetaApiError(String),

    #[error("Meta API returned status {status}: {body}")]
    MetaApiStatus { status: u16, body: String },

    #[error("Failed to resolve image URL for hash {hash}: {reason}")]
    ImageResolutionFailed { hash: String, reason: String },

    // ============================================================================
    // Generative Model Errors
    // ============================================================================
    #[error("Model request failed: {0}")]
    ModelRequestFailed(String),

    #[error("Empty content in AI response")]
    EmptyModelResponse,

    #[error("No tool calls found in response")]
    MissingToolCall,

    #[error("Failed after {attempts} attempts: {last_error}")]
    ModelRetriesExhausted { attempts: u32, last_error: String },

    // ============================================================================
    // Generic/System Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mutex lock error")]
    LockError,

    #[error("{0}")]
    GenericError(String),
}

impl InsightsError {
    /// Whether this error is a precondition failure raised by step validation
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            InsightsError::MissingRequiredKeys { .. } | InsightsError::PreconditionFailed { .. }
        )
    }

    /// Name of the step a precondition or dependency error was raised for
    ///
    /// Execution errors come back exactly as the step produced them and
    /// carry no step name.
    pub fn step_name(&self) -> Option<&str> {
        match self {
            InsightsError::MissingRequiredKeys { step, .. }
            | InsightsError::PreconditionFailed { step, .. }
            | InsightsError::UnsatisfiedDependency { step, .. } => Some(step),
            _ => None,
        }
    }
}

// Implement conversion from PoisonError for Mutex locks
impl<T> From<std::sync::PoisonError<T>> for InsightsError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        InsightsError::LockError
    }
}

impl From<reqwest::Error> for InsightsError {
    fn from(err: reqwest::Error) -> Self {
        InsightsError::NetworkError(err.to_string())
    }
}

impl From<String> for InsightsError {
    fn from(err: String) -> Self {
        InsightsError::GenericError(err)
    }
}

impl From<&str> for InsightsError {
    fn from(err: &str) -> Self {
        InsightsError::GenericError(err.to_string())
    }
}

// Helper type alias for Results
pub type InsightsResult<T> = Result<T, InsightsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_lists_every_key() {
        let err = InsightsError::MissingRequiredKeys {
            step: "Fetch Meta Ads".to_string(),
            missing: vec!["accountId".to_string(), "accessToken".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required keys in context for step 'Fetch Meta Ads': accountId, accessToken"
        );
        assert!(err.is_precondition());
        assert_eq!(err.step_name(), Some("Fetch Meta Ads"));
    }

    #[test]
    fn test_execution_errors_are_not_preconditions() {
        let err = InsightsError::EmptyModelResponse;
        assert!(!err.is_precondition());
        assert_eq!(err.step_name(), None);

        let err = InsightsError::UnsatisfiedDependency {
            step: "Identify Brand Type".to_string(),
            key: "ads".to_string(),
        };
        assert!(!err.is_precondition());
        assert_eq!(err.step_name(), Some("Identify Brand Type"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: InsightsError = io_err.into();
        assert!(matches!(err, InsightsError::Io(_)));
        assert_eq!(err.step_name(), None);
    }

    #[test]
    fn test_meta_status_display() {
        let err = InsightsError::MetaApiStatus {
            status: 400,
            body: "bad token".to_string(),
        };
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("bad token"));
    }
}
