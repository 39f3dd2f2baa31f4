use crate::analysis::prompt::{pattern_messages, Performance};
use crate::analysis::ranking::{bottom_performing_by_revenue, top_performing_by_revenue};
use crate::config::AnalysisConfig;
use crate::error::{InsightsError, InsightsResult};
use crate::genai::{ModelInvoker, ModelRequest};
use crate::pipeline::context::{ContextKey, ContextValue, PipelineContext};
use crate::pipeline::core::{validate_required_keys, PipelineStep};
use async_trait::async_trait;
use std::sync::Arc;

const REQUIRED: &[ContextKey] = &[ContextKey::Ads];

/// Summarize creative patterns of the top or bottom ads by revenue
///
/// Both variants share the same flow and differ only in which end of the
/// ranking they look at and which key they write.
pub struct FindPatternStep {
    performance: Performance,
    invoker: Arc<dyn ModelInvoker>,
    config: AnalysisConfig,
}

impl FindPatternStep {
    pub fn high(invoker: Arc<dyn ModelInvoker>, config: &AnalysisConfig) -> Self {
        Self {
            performance: Performance::High,
            invoker,
            config: *config,
        }
    }

    pub fn low(invoker: Arc<dyn ModelInvoker>, config: &AnalysisConfig) -> Self {
        Self {
            performance: Performance::Low,
            invoker,
            config: *config,
        }
    }

    pub fn performance(&self) -> Performance {
        self.performance
    }
}

#[async_trait]
impl PipelineStep for FindPatternStep {
    fn name(&self) -> &str {
        match self.performance {
            Performance::High => "Find High Performing Patterns",
            Performance::Low => "Find Low Performing Patterns",
        }
    }

    fn required_keys(&self) -> &[ContextKey] {
        REQUIRED
    }

    fn output_key(&self) -> ContextKey {
        match self.performance {
            Performance::High => ContextKey::HighPerformingPatterns,
            Performance::Low => ContextKey::LowPerformingPatterns,
        }
    }

    fn validate(&self, context: &PipelineContext) -> InsightsResult<()> {
        validate_required_keys(self.name(), self.required_keys(), context)?;

        let count = match context.get(ContextKey::Ads) {
            Some(ContextValue::Ads(ads)) => ads.len(),
            _ => 0,
        };
        if count < self.config.min_ads {
            return Err(InsightsError::PreconditionFailed {
                step: self.name().to_string(),
                reason: format!(
                    "at least {} ads are required, found {}",
                    self.config.min_ads, count
                ),
            });
        }
        Ok(())
    }

    async fn run(&self, context: &PipelineContext) -> InsightsResult<ContextValue> {
        let ads = context.get_ads(ContextKey::Ads)?;
        let selected = match self.performance {
            Performance::High => {
                top_performing_by_revenue(ads, self.config.percentile, self.config.limit)
            }
            Performance::Low => {
                bottom_performing_by_revenue(ads, self.config.percentile, self.config.limit)
            }
        };

        tracing::info!(
            target: "pipeline::patterns",
            "Analyzing {} {} ads out of {}",
            selected.len(),
            self.performance.label(),
            ads.len()
        );

        let request = ModelRequest::new(pattern_messages(
            self.performance,
            &selected,
            self.config.max_prompt_images,
        ));
        let summary = self.invoker.request_string_output(&request).await?;
        Ok(ContextValue::Text(summary))
    }
}
