//! The closed set of workflow steps
//!
//! Each variant wraps a concrete [`PipelineStep`]. The engine only sees
//! [`WorkflowStep`], which validates, runs and merges the single output key.

pub mod brand_type;
pub mod fetch_ads;
pub mod patterns;
pub mod recommendations;

pub use brand_type::IdentifyBrandTypeStep;
pub use fetch_ads::FetchAdsStep;
pub use patterns::FindPatternStep;
pub use recommendations::GenerateRecommendationsStep;

use super::context::{ContextKey, PipelineContext};
use super::core::PipelineStep;
use crate::error::InsightsResult;

pub enum WorkflowStep {
    FetchAds(FetchAdsStep),
    IdentifyBrandType(IdentifyBrandTypeStep),
    FindHighPerformingPattern(FindPatternStep),
    FindLowPerformingPattern(FindPatternStep),
    GenerateRecommendations(GenerateRecommendationsStep),
}

impl WorkflowStep {
    /// The wrapped step behind the shared interface
    pub fn as_step(&self) -> &dyn PipelineStep {
        match self {
            WorkflowStep::FetchAds(step) => step,
            WorkflowStep::IdentifyBrandType(step) => step,
            WorkflowStep::FindHighPerformingPattern(step) => step,
            WorkflowStep::FindLowPerformingPattern(step) => step,
            WorkflowStep::GenerateRecommendations(step) => step,
        }
    }

    pub fn name(&self) -> &str {
        self.as_step().name()
    }

    pub fn required_keys(&self) -> &[ContextKey] {
        self.as_step().required_keys()
    }

    pub fn optional_keys(&self) -> &[ContextKey] {
        self.as_step().optional_keys()
    }

    pub fn output_key(&self) -> ContextKey {
        self.as_step().output_key()
    }

    pub fn validate(&self, context: &PipelineContext) -> InsightsResult<()> {
        self.as_step().validate(context)
    }

    /// Run the step and return `context` plus its output key
    ///
    /// A failure is returned as the step raised it and the input context is
    /// dropped.
    pub async fn execute(&self, context: PipelineContext) -> InsightsResult<PipelineContext> {
        let step = self.as_step();
        let value = step.run(&context).await?;
        context.with_value(step.output_key(), value)
    }
}

impl From<FetchAdsStep> for WorkflowStep {
    fn from(step: FetchAdsStep) -> Self {
        WorkflowStep::FetchAds(step)
    }
}

impl From<IdentifyBrandTypeStep> for WorkflowStep {
    fn from(step: IdentifyBrandTypeStep) -> Self {
        WorkflowStep::IdentifyBrandType(step)
    }
}

impl From<FindPatternStep> for WorkflowStep {
    fn from(step: FindPatternStep) -> Self {
        match step.performance() {
            crate::analysis::Performance::High => WorkflowStep::FindHighPerformingPattern(step),
            crate::analysis::Performance::Low => WorkflowStep::FindLowPerformingPattern(step),
        }
    }
}

impl From<GenerateRecommendationsStep> for WorkflowStep {
    fn from(step: GenerateRecommendationsStep) -> Self {
        WorkflowStep::GenerateRecommendations(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::error::InsightsError;
    use crate::genai::MockModelInvoker;
    use crate::pipeline::context::ContextValue;
    use std::sync::Arc;

    fn context() -> PipelineContext {
        PipelineContext::new()
            .with_text(ContextKey::AccountId, "act_1")
            .unwrap()
            .with_text(ContextKey::HighPerformingPatterns, "high")
            .unwrap()
            .with_text(ContextKey::LowPerformingPatterns, "low")
            .unwrap()
    }

    #[test]
    fn test_pattern_variants_follow_performance() {
        let invoker = Arc::new(MockModelInvoker::new());
        let config = AnalysisConfig::default();

        let high: WorkflowStep = FindPatternStep::high(invoker.clone(), &config).into();
        let low: WorkflowStep = FindPatternStep::low(invoker, &config).into();

        assert!(matches!(high, WorkflowStep::FindHighPerformingPattern(_)));
        assert!(matches!(low, WorkflowStep::FindLowPerformingPattern(_)));
        assert_eq!(high.output_key(), ContextKey::HighPerformingPatterns);
        assert_eq!(low.output_key(), ContextKey::LowPerformingPatterns);
    }

    #[tokio::test]
    async fn test_execute_adds_exactly_one_key() {
        let invoker = Arc::new(
            MockModelInvoker::new()
                .with_string_response("synthesis")
                .with_structured_response(serde_json::json!({
                    "whatsWorking": ["a"],
                    "whatsNotWorking": ["b"],
                    "recommendations": "c"
                })),
        );
        let step: WorkflowStep = GenerateRecommendationsStep::new(invoker).into();

        let before = context();
        let before_json = serde_json::to_value(&before).unwrap();
        let after = step.execute(before).await.unwrap();
        let after_json = serde_json::to_value(&after).unwrap();

        assert_eq!(after.len(), 4);
        for key in ["accountId", "highPerformingPatterns", "lowPerformingPatterns"] {
            assert_eq!(after_json[key], before_json[key]);
        }
        assert!(matches!(
            after.get(ContextKey::Recommendations),
            Some(ContextValue::Recommendations(_))
        ));
    }

    #[tokio::test]
    async fn test_execute_returns_step_error_unchanged() {
        let step: WorkflowStep =
            GenerateRecommendationsStep::new(Arc::new(MockModelInvoker::failing("down"))).into();

        let err = step.execute(context()).await.unwrap_err();
        match err {
            InsightsError::ModelRequestFailed(message) => assert_eq!(message, "down"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
