//! Creative insights for Meta ads
//!
//! Fetches active ads from the Meta Graph API, resolves their creative
//! images and runs a fixed workflow pipeline that asks a generative model
//! for brand type, creative patterns and recommendations.

pub mod analysis;
pub mod config;
pub mod error;
pub mod genai;
pub mod knowledge;
pub mod logger;
pub mod meta;
pub mod models;
pub mod pipeline;

use config::AppConfig;
use genai::ModelInvoker;
use meta::AdsMetricsProvider;
use pipeline::{
    ContextKey, FetchAdsStep, FindPatternStep, GenerateRecommendationsStep,
    IdentifyBrandTypeStep, WorkflowPipeline,
};
use std::sync::Arc;

/// Keys the caller supplies in the initial context
pub const SEED_KEYS: &[ContextKey] = &[
    ContextKey::AccountId,
    ContextKey::AccessToken,
    ContextKey::CreatorName,
];

/// Build the fixed five-step insights pipeline
pub fn build_insights_pipeline(
    provider: Arc<dyn AdsMetricsProvider>,
    invoker: Arc<dyn ModelInvoker>,
    config: &AppConfig,
) -> error::InsightsResult<WorkflowPipeline> {
    WorkflowPipeline::builder("creative-insights")
        .seed_keys(SEED_KEYS)
        .add_task(FetchAdsStep::new(provider))
        .add_task(IdentifyBrandTypeStep::new(invoker.clone(), &config.analysis))
        .add_task(FindPatternStep::high(invoker.clone(), &config.analysis))
        .add_task(FindPatternStep::low(invoker.clone(), &config.analysis))
        .add_task(GenerateRecommendationsStep::new(invoker))
        .build()
}
