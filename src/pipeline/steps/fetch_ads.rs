use crate::error::InsightsResult;
use crate::meta::AdsMetricsProvider;
use crate::pipeline::context::{ContextKey, ContextValue, PipelineContext};
use crate::pipeline::core::PipelineStep;
use async_trait::async_trait;
use std::sync::Arc;

const REQUIRED: &[ContextKey] = &[ContextKey::AccountId, ContextKey::AccessToken];

/// Fetch active ads and keep the ones with at least one image
pub struct FetchAdsStep {
    provider: Arc<dyn AdsMetricsProvider>,
}

impl FetchAdsStep {
    pub fn new(provider: Arc<dyn AdsMetricsProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl PipelineStep for FetchAdsStep {
    fn name(&self) -> &str {
        "Fetch Meta Ads"
    }

    fn required_keys(&self) -> &[ContextKey] {
        REQUIRED
    }

    fn output_key(&self) -> ContextKey {
        ContextKey::Ads
    }

    async fn run(&self, context: &PipelineContext) -> InsightsResult<ContextValue> {
        let account_id = context.get_text(ContextKey::AccountId)?;
        let access_token = context.get_text(ContextKey::AccessToken)?;

        let ads = self
            .provider
            .get_active_ads_with_images(account_id, access_token)
            .await?;
        let fetched = ads.len();
        let ads: Vec<_> = ads.into_iter().filter(|ad| ad.has_images()).collect();

        tracing::info!(
            target: "pipeline::fetch_ads",
            "Fetched {} ads for {}, {} with images",
            fetched,
            account_id,
            ads.len()
        );
        Ok(ContextValue::Ads(ads))
    }
}
