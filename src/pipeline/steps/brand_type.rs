use crate::analysis::prompt::brand_type_messages;
use crate::config::AnalysisConfig;
use crate::error::{InsightsError, InsightsResult};
use crate::genai::{ModelInvoker, ModelRequest, OutputSchema};
use crate::models::BrandType;
use crate::pipeline::context::{ContextKey, ContextValue, PipelineContext};
use crate::pipeline::core::PipelineStep;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

const REQUIRED: &[ContextKey] = &[ContextKey::Ads];

/// Classify the brand behind the account's ad creatives
pub struct IdentifyBrandTypeStep {
    invoker: Arc<dyn ModelInvoker>,
    sample_size: usize,
    max_images: usize,
}

impl IdentifyBrandTypeStep {
    pub fn new(invoker: Arc<dyn ModelInvoker>, config: &AnalysisConfig) -> Self {
        Self {
            invoker,
            sample_size: config.brand_sample_size,
            max_images: config.max_prompt_images,
        }
    }
}

/// Function schema the model must call with one brand label
pub fn brand_type_schema() -> OutputSchema {
    let labels: Vec<&str> = BrandType::ALL.iter().map(|b| b.as_str()).collect();
    OutputSchema::new(
        "predict_brand_type",
        "Find the type of brand by the meta ad creative",
        json!({
            "type": "object",
            "properties": {
                "brand_type": {
                    "type": "string",
                    "enum": labels,
                    "description": "Type of brand"
                }
            },
            "required": ["brand_type"]
        }),
    )
}

#[async_trait]
impl PipelineStep for IdentifyBrandTypeStep {
    fn name(&self) -> &str {
        "Identify Brand Type"
    }

    fn required_keys(&self) -> &[ContextKey] {
        REQUIRED
    }

    fn output_key(&self) -> ContextKey {
        ContextKey::BrandType
    }

    async fn run(&self, context: &PipelineContext) -> InsightsResult<ContextValue> {
        let ads = context.get_ads(ContextKey::Ads)?;
        let sample = &ads[..ads.len().min(self.sample_size)];

        let request = ModelRequest::new(brand_type_messages(sample, self.max_images));
        let output = self
            .invoker
            .request_structured_output(&request, &brand_type_schema())
            .await?;

        let label = output
            .get("brand_type")
            .and_then(|value| value.as_str())
            .ok_or_else(|| {
                InsightsError::ModelRequestFailed(format!(
                    "predict_brand_type returned no brand_type: {}",
                    output
                ))
            })?;
        let brand = BrandType::from_label(label);

        tracing::info!(target: "pipeline::brand_type", "Brand type identified: {}", brand);
        Ok(ContextValue::text(brand.as_str()))
    }
}
