use super::performance::get_active_ads;
use super::{AdsMetricsProvider, GraphApi, QueryParams};
use crate::error::{InsightsError, InsightsResult};
use crate::models::{AdMetrics, AdMetricsWithImages};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;

/// Active ads with their creative image URLs resolved
///
/// Every image hash is looked up through the account's `adimages` edge.
/// Lookups are cached for the duration of one
/// [`get_active_ads_with_images`](AdsMetricsProvider::get_active_ads_with_images)
/// call. An ad whose hashes cannot all be resolved is left out.
pub struct MetaAdsWithImagesService<C: GraphApi> {
    client: C,
}

impl<C: GraphApi> MetaAdsWithImagesService<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Resolve the permalink URL of a single image hash
    pub async fn fetch_image_url(
        &self,
        account_id: &str,
        access_token: &str,
        hash: &str,
    ) -> InsightsResult<String> {
        let endpoint = format!("/{}/adimages", account_id);
        let params = image_params(access_token, hash);

        let response = self
            .client
            .fetch_data(&endpoint, &params)
            .await
            .map_err(|e| InsightsError::ImageResolutionFailed {
                hash: hash.to_string(),
                reason: e.to_string(),
            })?;

        response
            .data
            .first()
            .and_then(|image| image.get("permalink_url"))
            .and_then(|url| url.as_str())
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .ok_or_else(|| InsightsError::ImageResolutionFailed {
                hash: hash.to_string(),
                reason: "no image returned".to_string(),
            })
    }

    async fn resolve_images(
        &self,
        account_id: &str,
        access_token: &str,
        ad: &AdMetrics,
        cache: &mut HashMap<String, String>,
    ) -> InsightsResult<Vec<String>> {
        let mut urls = Vec::with_capacity(ad.image_hashes.len());
        for hash in &ad.image_hashes {
            if let Some(url) = cache.get(hash) {
                urls.push(url.clone());
                continue;
            }
            let url = self.fetch_image_url(account_id, access_token, hash).await?;
            cache.insert(hash.clone(), url.clone());
            urls.push(url);
        }
        Ok(urls)
    }
}

fn image_params(access_token: &str, hash: &str) -> QueryParams {
    vec![
        ("fields".to_string(), json!(["id", "permalink_url", "hash"]).to_string()),
        ("access_token".to_string(), access_token.to_string()),
        ("hashes".to_string(), json!([hash]).to_string()),
        ("limit".to_string(), "10".to_string()),
    ]
}

#[async_trait]
impl<C: GraphApi> AdsMetricsProvider for MetaAdsWithImagesService<C> {
    async fn get_active_ads_with_images(
        &self,
        account_id: &str,
        access_token: &str,
    ) -> InsightsResult<Vec<AdMetricsWithImages>> {
        let ads = get_active_ads(&self.client, account_id, access_token).await?;
        let total = ads.len();
        let mut cache = HashMap::new();
        let mut result = Vec::with_capacity(total);

        for ad in ads {
            let resolved = self
                .resolve_images(account_id, access_token, &ad, &mut cache)
                .await;
            match resolved {
                Ok(urls) => result.push(AdMetricsWithImages::new(ad, urls)),
                Err(e) => {
                    tracing::warn!(
                        target: "meta::images",
                        "Error processing ad {}: {}. Skipping this ad entirely.",
                        ad.ad_id,
                        e
                    );
                }
            }
        }

        tracing::info!(
            target: "meta::images",
            "Resolved images for {}/{} ads ({} unique hashes)",
            result.len(),
            total,
            cache.len()
        );
        Ok(result)
    }
}
