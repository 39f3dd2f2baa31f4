use super::AdsMetricsProvider;
use crate::error::{InsightsError, InsightsResult};
use crate::models::AdMetricsWithImages;
use async_trait::async_trait;
use std::sync::Mutex;

/// Ads provider returning a fixed list
///
/// Records the `(account_id, access_token)` pairs it was called with.
pub struct MockAdsProvider {
    ads: Vec<AdMetricsWithImages>,
    failure: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockAdsProvider {
    pub fn new(ads: Vec<AdMetricsWithImages>) -> Self {
        Self {
            ads,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every call fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AdsMetricsProvider for MockAdsProvider {
    async fn get_active_ads_with_images(
        &self,
        account_id: &str,
        access_token: &str,
    ) -> InsightsResult<Vec<AdMetricsWithImages>> {
        self.calls
            .lock()?
            .push((account_id.to_string(), access_token.to_string()));

        match &self.failure {
            Some(message) => Err(InsightsError::MetaApiError(message.clone())),
            None => Ok(self.ads.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::ad;

    #[tokio::test]
    async fn test_returns_fixed_ads() {
        let provider = MockAdsProvider::new(vec![ad("1", 5.0, &["u1"])]);
        let ads = provider.get_active_ads_with_images("act_1", "t").await.unwrap();

        assert_eq!(ads.len(), 1);
        assert_eq!(provider.calls(), vec![("act_1".to_string(), "t".to_string())]);
    }

    #[tokio::test]
    async fn test_failing_provider() {
        let provider = MockAdsProvider::failing("rate limited");
        let err = provider.get_active_ads_with_images("act_1", "t").await.unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }
}
