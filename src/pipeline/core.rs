use crate::error::{InsightsError, InsightsResult};
use async_trait::async_trait;
use std::time::Duration;

use super::context::{ContextKey, ContextValue, PipelineContext};

/// A single step in the workflow pipeline
///
/// A step declares the context keys it needs and the one key it produces.
/// It only computes its output value; merging that value into the context is
/// done by [`WorkflowStep::execute`](super::steps::WorkflowStep::execute), so
/// a step can never touch any other key.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use creative_insights::error::InsightsResult;
/// use creative_insights::pipeline::{ContextKey, ContextValue, PipelineContext, PipelineStep};
///
/// struct ShoutStep;
///
/// #[async_trait]
/// impl PipelineStep for ShoutStep {
///     fn name(&self) -> &str {
///         "Shout"
///     }
///
///     fn required_keys(&self) -> &[ContextKey] {
///         &[ContextKey::CreatorName]
///     }
///
///     fn output_key(&self) -> ContextKey {
///         ContextKey::BrandType
///     }
///
///     async fn run(&self, context: &PipelineContext) -> InsightsResult<ContextValue> {
///         let name = context.get_text(ContextKey::CreatorName)?;
///         Ok(ContextValue::text(name.to_uppercase()))
///     }
/// }
/// ```
#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// Get step name for logging and error reporting
    fn name(&self) -> &str;

    /// Keys that must be present before this step may run
    fn required_keys(&self) -> &[ContextKey];

    /// Keys this step reads when present
    fn optional_keys(&self) -> &[ContextKey] {
        &[]
    }

    /// The single key this step writes
    fn output_key(&self) -> ContextKey;

    /// Check preconditions against the context
    ///
    /// The default checks presence of every required key and reports all of
    /// the missing ones. Overrides should call [`validate_required_keys`]
    /// first and then apply their own constraints.
    fn validate(&self, context: &PipelineContext) -> InsightsResult<()> {
        validate_required_keys(self.name(), self.required_keys(), context)
    }

    /// Compute this step's output value
    ///
    /// All asynchronous work must be resolved before this returns.
    async fn run(&self, context: &PipelineContext) -> InsightsResult<ContextValue>;
}

/// Presence check shared by every step
pub fn validate_required_keys(
    step_name: &str,
    required: &[ContextKey],
    context: &PipelineContext,
) -> InsightsResult<()> {
    let missing = context.missing_keys(required);
    if missing.is_empty() {
        return Ok(());
    }
    Err(InsightsError::MissingRequiredKeys {
        step: step_name.to_string(),
        missing: missing.iter().map(|key| key.to_string()).collect(),
    })
}

/// Result of a completed step
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Step name
    pub step_name: String,

    /// Key the step wrote
    pub output_key: ContextKey,

    /// Duration of execution
    pub duration: Duration,
}

impl StepResult {
    pub fn new(step_name: impl Into<String>, output_key: ContextKey, duration: Duration) -> Self {
        Self {
            step_name: step_name.into(),
            output_key,
            duration,
        }
    }
}

/// Report of a complete, successful pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Pipeline name
    pub pipeline_name: String,

    /// Results from each step, in execution order
    pub step_results: Vec<StepResult>,

    /// Total duration
    pub total_duration: Duration,
}

impl PipelineReport {
    /// Names of the executed steps, in execution order
    pub fn step_names(&self) -> Vec<&str> {
        self.step_results
            .iter()
            .map(|r| r.step_name.as_str())
            .collect()
    }

    /// The slowest step, if any ran
    pub fn slowest_step(&self) -> Option<&StepResult> {
        self.step_results.iter().max_by_key(|r| r.duration)
    }
}
