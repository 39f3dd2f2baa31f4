use crate::analysis::prompt::{recommendation_extraction_messages, recommendation_messages};
use crate::error::InsightsResult;
use crate::genai::{ModelInvoker, ModelRequest, OutputSchema};
use crate::knowledge::fetch_creator_data;
use crate::models::Recommendations;
use crate::pipeline::context::{ContextKey, ContextValue, PipelineContext};
use crate::pipeline::core::PipelineStep;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

const REQUIRED: &[ContextKey] = &[
    ContextKey::HighPerformingPatterns,
    ContextKey::LowPerformingPatterns,
];

const OPTIONAL: &[ContextKey] = &[ContextKey::CreatorName, ContextKey::BrandType];

const RECOMMENDATION_MAX_TOKENS: u32 = 1000;

/// Turn pattern summaries into "what's working / what's not" recommendations
///
/// The model first writes a free-text synthesis; a second, structured call
/// sees that synthesis and extracts the [`Recommendations`] object.
pub struct GenerateRecommendationsStep {
    invoker: Arc<dyn ModelInvoker>,
}

impl GenerateRecommendationsStep {
    pub fn new(invoker: Arc<dyn ModelInvoker>) -> Self {
        Self { invoker }
    }
}

pub fn recommendations_schema() -> OutputSchema {
    OutputSchema::new(
        "extract_recommendations",
        "Extract what is working, what is not working and the overall recommendation",
        json!({
            "type": "object",
            "properties": {
                "whatsWorking": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Creative elements that drive performance"
                },
                "whatsNotWorking": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Creative elements that hold performance back"
                },
                "recommendations": {
                    "type": "string",
                    "description": "Overall recommendation for the creative team"
                }
            },
            "required": ["whatsWorking", "whatsNotWorking", "recommendations"]
        }),
    )
}

#[async_trait]
impl PipelineStep for GenerateRecommendationsStep {
    fn name(&self) -> &str {
        "Generate What's Working What's Not"
    }

    fn required_keys(&self) -> &[ContextKey] {
        REQUIRED
    }

    fn optional_keys(&self) -> &[ContextKey] {
        OPTIONAL
    }

    fn output_key(&self) -> ContextKey {
        ContextKey::Recommendations
    }

    async fn run(&self, context: &PipelineContext) -> InsightsResult<ContextValue> {
        let high = context.get_text(ContextKey::HighPerformingPatterns)?;
        let low = context.get_text(ContextKey::LowPerformingPatterns)?;

        let knowledge = match (
            context.get_optional_text(ContextKey::CreatorName),
            context.get_optional_text(ContextKey::BrandType),
        ) {
            (Some(creator), Some(brand)) => fetch_creator_data(creator, brand),
            _ => None,
        };
        if knowledge.is_some() {
            tracing::debug!(target: "pipeline::recommendations", "Using creator knowledge");
        }

        let synthesis_request = ModelRequest::new(recommendation_messages(high, low, knowledge))
            .with_max_tokens(RECOMMENDATION_MAX_TOKENS);
        let synthesis = self.invoker.request_string_output(&synthesis_request).await?;

        let extraction_request = ModelRequest::new(recommendation_extraction_messages(
            high, low, knowledge, &synthesis,
        ))
        .with_max_tokens(RECOMMENDATION_MAX_TOKENS);
        let output = self
            .invoker
            .request_structured_output(&extraction_request, &recommendations_schema())
            .await?;

        let recommendations: Recommendations = serde_json::from_value(output)?;
        tracing::info!(
            target: "pipeline::recommendations",
            "Generated {} working and {} not-working insights",
            recommendations.whats_working.len(),
            recommendations.whats_not_working.len()
        );
        Ok(ContextValue::Recommendations(recommendations))
    }
}
