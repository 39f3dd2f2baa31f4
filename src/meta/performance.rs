//! Active-ad query and metrics extraction from raw Graph API ad objects

use super::{GraphApi, QueryParams};
use crate::error::{InsightsError, InsightsResult};
use crate::models::AdMetrics;
use serde::Deserialize;
use serde_json::{json, Value};

const PURCHASE_ACTION_TYPES: [&str; 2] = ["purchase", "offsite_conversion.fb_pixel_purchase"];

const ADS_PAGE_LIMIT: u32 = 400;

#[derive(Debug, Default, Deserialize)]
struct RawAd {
    id: Option<String>,
    name: Option<String>,
    effective_status: Option<String>,
    campaign: Option<RawCampaign>,
    creative: Option<RawCreative>,
    insights: Option<RawInsights>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCampaign {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawCreative {
    video_id: Option<String>,
    asset_feed_spec: Option<AssetFeedSpec>,
    object_story_spec: Option<ObjectStorySpec>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetFeedSpec {
    #[serde(default)]
    images: Vec<AssetImage>,
    #[serde(default)]
    videos: Vec<AssetVideo>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetImage {
    hash: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetVideo {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ObjectStorySpec {
    link_data: Option<LinkData>,
    video_data: Option<VideoData>,
}

#[derive(Debug, Default, Deserialize)]
struct LinkData {
    image_hash: Option<String>,
    #[serde(default)]
    child_attachments: Vec<ChildAttachment>,
}

#[derive(Debug, Default, Deserialize)]
struct ChildAttachment {
    image_hash: Option<String>,
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VideoData {
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawInsights {
    #[serde(default)]
    data: Vec<InsightRow>,
}

#[derive(Debug, Default, Deserialize)]
struct InsightRow {
    spend: Option<Value>,
    #[serde(default)]
    action_values: Vec<ActionValue>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ActionValue {
    action_type: Option<String>,
    value: Option<Value>,
}

/// Image hashes, video ids and carousel flag of one creative
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaInfo {
    pub image_hashes: Vec<String>,
    pub video_hashes: Vec<String>,
    pub is_carousel: bool,
}

impl MediaInfo {
    fn add_image(&mut self, hash: Option<&String>) {
        push_unique(&mut self.image_hashes, hash);
    }

    fn add_video(&mut self, id: Option<&String>) {
        push_unique(&mut self.video_hashes, id);
    }
}

/// Append a non-blank id unless already present
fn push_unique(ids: &mut Vec<String>, id: Option<&String>) {
    if let Some(id) = id {
        if !id.trim().is_empty() && !ids.contains(id) {
            ids.push(id.clone());
        }
    }
}

pub fn ads_endpoint(account_id: &str) -> String {
    format!("/{}/ads", account_id)
}

/// Query for active ads with creative and lifetime insights
pub fn ads_params(access_token: &str) -> QueryParams {
    let fields = json!([
        "name",
        "status",
        "effective_status",
        "id",
        "campaign{name}",
        "creative{image_url,image_hash,object_type,video_id,asset_feed_spec,object_story_spec}",
        "insights.date_preset(maximum){created_time,spend,campaign_name,purchase_roas,action_values,actions}"
    ]);
    let filtering = json!([{
        "field": "effective_status",
        "operator": "IN",
        "value": ["ACTIVE"]
    }]);

    vec![
        ("fields".to_string(), fields.to_string()),
        ("access_token".to_string(), access_token.to_string()),
        ("limit".to_string(), ADS_PAGE_LIMIT.to_string()),
        ("filtering".to_string(), filtering.to_string()),
    ]
}

/// Fetch every active ad of an account and extract its metrics
///
/// Ads that cannot be processed are skipped. Fails only when no page at all
/// could be fetched.
pub async fn get_active_ads<C>(
    client: &C,
    account_id: &str,
    access_token: &str,
) -> InsightsResult<Vec<AdMetrics>>
where
    C: GraphApi + ?Sized,
{
    let endpoint = ads_endpoint(account_id);
    let result = client
        .fetch_paginated_data(&endpoint, &ads_params(access_token))
        .await;

    if result.stats.successful_pages == 0 {
        if let Some(error) = result.last_error {
            return Err(InsightsError::MetaApiError(format!(
                "Failed to fetch ads for account {}: {}",
                account_id, error
            )));
        }
    }

    tracing::info!(
        target: "meta::performance",
        "Fetched {} raw ads for {} ({} pages, {} failed)",
        result.items.len(),
        account_id,
        result.stats.total_pages,
        result.stats.failed_pages
    );

    Ok(result.items.into_iter().filter_map(process_ad_to_metrics).collect())
}

/// Convert one raw ad object into metrics
///
/// Returns `None` for ads without an id or without insights.
pub fn process_ad_to_metrics(raw: Value) -> Option<AdMetrics> {
    let ad: RawAd = match serde_json::from_value(raw) {
        Ok(ad) => ad,
        Err(e) => {
            tracing::warn!(target: "meta::performance", "Skipping malformed ad: {}", e);
            return None;
        }
    };

    let Some(ad_id) = ad.id.filter(|id| !id.is_empty()) else {
        tracing::debug!(target: "meta::performance", "Skipping ad without id");
        return None;
    };

    let Some(insights) = ad.insights.as_ref().and_then(|i| i.data.first()) else {
        tracing::debug!(target: "meta::performance", "Skipping ad {}: missing insights", ad_id);
        return None;
    };

    let spend = parse_amount(insights.spend.as_ref());
    let revenue = calculate_revenue(&insights.action_values);
    let roas = if spend > 0.0 { revenue / spend } else { 0.0 };
    let media = extract_media_info(ad.creative.as_ref());

    Some(AdMetrics {
        ad_id,
        ad_name: ad
            .name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Unnamed Ad".to_string()),
        campaign_name: ad
            .campaign
            .and_then(|campaign| campaign.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Unknown Campaign".to_string()),
        is_active: ad.effective_status.as_deref() == Some("ACTIVE"),
        spend,
        revenue,
        roas,
        is_carousel: media.is_carousel,
        image_hashes: media.image_hashes,
        video_hashes: media.video_hashes,
    })
}

/// Collect media ids in first-seen order
pub(crate) fn extract_media_info(creative: Option<&RawCreative>) -> MediaInfo {
    let mut media = MediaInfo::default();
    let Some(creative) = creative else {
        return media;
    };

    if let Some(feed) = &creative.asset_feed_spec {
        for video in &feed.videos {
            media.add_video(video.video_id.as_ref());
        }
        for image in &feed.images {
            media.add_image(image.hash.as_ref());
        }
    }

    let story = creative.object_story_spec.as_ref();
    let link_data = story.and_then(|s| s.link_data.as_ref());

    if let Some(link) = link_data {
        if !link.child_attachments.is_empty() {
            media.is_carousel = true;
            for attachment in &link.child_attachments {
                media.add_image(attachment.image_hash.as_ref());
                media.add_video(attachment.video_id.as_ref());
            }
        }
    }

    media.add_video(story.and_then(|s| s.video_data.as_ref()).and_then(|v| v.video_id.as_ref()));

    if media.video_hashes.is_empty() {
        media.add_video(creative.video_id.as_ref());
    }

    media.add_image(link_data.and_then(|link| link.image_hash.as_ref()));

    media
}

/// Sum of purchase action values
pub(crate) fn calculate_revenue(action_values: &[ActionValue]) -> f64 {
    action_values
        .iter()
        .filter(|action| {
            action
                .action_type
                .as_deref()
                .is_some_and(|t| PURCHASE_ACTION_TYPES.contains(&t))
        })
        .map(|action| parse_amount(action.value.as_ref()))
        .sum()
}

/// Graph API amounts arrive as strings or numbers; anything else is zero
fn parse_amount(value: Option<&Value>) -> f64 {
    let amount = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    amount.filter(|a| a.is_finite()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::testing::{page, param, ScriptedGraphApi};

    fn raw_ad() -> Value {
        json!({
            "id": "23851",
            "name": "Summer Glow",
            "effective_status": "ACTIVE",
            "campaign": {"name": "Summer"},
            "creative": {
                "object_story_spec": {
                    "link_data": {"image_hash": "h-main"}
                }
            },
            "insights": {
                "data": [{
                    "spend": "200.50",
                    "action_values": [
                        {"action_type": "purchase", "value": "300"},
                        {"action_type": "offsite_conversion.fb_pixel_purchase", "value": "101"},
                        {"action_type": "add_to_cart", "value": "999"}
                    ]
                }]
            }
        })
    }

    #[test]
    fn test_process_ad_to_metrics() {
        let metrics = process_ad_to_metrics(raw_ad()).unwrap();
        assert_eq!(metrics.ad_id, "23851");
        assert_eq!(metrics.ad_name, "Summer Glow");
        assert_eq!(metrics.campaign_name, "Summer");
        assert!(metrics.is_active);
        assert_eq!(metrics.spend, 200.5);
        assert_eq!(metrics.revenue, 401.0);
        assert!((metrics.roas - 401.0 / 200.5).abs() < 1e-9);
        assert_eq!(metrics.image_hashes, vec!["h-main"]);
        assert!(!metrics.is_carousel);
    }

    #[test]
    fn test_defaults_for_missing_names() {
        let mut ad = raw_ad();
        ad.as_object_mut().unwrap().remove("name");
        ad.as_object_mut().unwrap().remove("campaign");
        ad["effective_status"] = json!("PAUSED");

        let metrics = process_ad_to_metrics(ad).unwrap();
        assert_eq!(metrics.ad_name, "Unnamed Ad");
        assert_eq!(metrics.campaign_name, "Unknown Campaign");
        assert!(!metrics.is_active);
    }

    #[test]
    fn test_skips_ads_without_id_or_insights() {
        let mut no_id = raw_ad();
        no_id.as_object_mut().unwrap().remove("id");
        assert!(process_ad_to_metrics(no_id).is_none());

        let mut no_insights = raw_ad();
        no_insights["insights"] = json!({"data": []});
        assert!(process_ad_to_metrics(no_insights).is_none());
    }

    #[test]
    fn test_zero_spend_gives_zero_roas() {
        let mut ad = raw_ad();
        ad["insights"]["data"][0]["spend"] = json!("not a number");
        let metrics = process_ad_to_metrics(ad).unwrap();
        assert_eq!(metrics.spend, 0.0);
        assert_eq!(metrics.roas, 0.0);
    }

    #[test]
    fn test_numeric_amounts() {
        let actions: Vec<ActionValue> = serde_json::from_value(json!([
            {"action_type": "purchase", "value": 12.5},
            {"action_type": "purchase", "value": "7.5"},
            {"action_type": "purchase"}
        ]))
        .unwrap();
        assert_eq!(calculate_revenue(&actions), 20.0);
    }

    #[test]
    fn test_carousel_media() {
        let creative: RawCreative = serde_json::from_value(json!({
            "video_id": "v-fallback",
            "asset_feed_spec": {
                "images": [{"hash": "h1"}, {"hash": ""}],
                "videos": [{"video_id": "v1"}]
            },
            "object_story_spec": {
                "link_data": {
                    "image_hash": "h3",
                    "child_attachments": [
                        {"image_hash": "h1"},
                        {"image_hash": "h2", "video_id": "v2"}
                    ]
                }
            }
        }))
        .unwrap();

        let media = extract_media_info(Some(&creative));
        assert!(media.is_carousel);
        assert_eq!(media.image_hashes, vec!["h1", "h2", "h3"]);
        assert_eq!(media.video_hashes, vec!["v1", "v2"]);
    }

    #[test]
    fn test_creative_video_id_is_fallback() {
        let creative: RawCreative =
            serde_json::from_value(json!({"video_id": "v-only"})).unwrap();
        let media = extract_media_info(Some(&creative));
        assert_eq!(media.video_hashes, vec!["v-only"]);
        assert!(media.image_hashes.is_empty());
        assert_eq!(extract_media_info(None), MediaInfo::default());
    }

    #[test]
    fn test_ads_params() {
        let params = ads_params("token");
        assert_eq!(param(&params, "access_token"), Some("token"));
        assert_eq!(param(&params, "limit"), Some("400"));
        assert!(param(&params, "filtering").unwrap().contains("ACTIVE"));
        assert!(param(&params, "fields").unwrap().contains("campaign{name}"));
    }

    #[tokio::test]
    async fn test_get_active_ads_filters_unusable() {
        let api = ScriptedGraphApi::new(|endpoint, _| {
            assert_eq!(endpoint, "/act_1/ads");
            Ok(page(vec![raw_ad(), json!({"name": "no id"})], None))
        });

        let ads = get_active_ads(&api, "act_1", "token").await.unwrap();
        assert_eq!(ads.len(), 1);
        assert_eq!(ads[0].ad_id, "23851");
    }

    #[tokio::test]
    async fn test_get_active_ads_fails_when_nothing_fetched() {
        let api = ScriptedGraphApi::new(|_, _| {
            Err(InsightsError::MetaApiStatus {
                status: 401,
                body: "Invalid OAuth access token".to_string(),
            })
        });

        let err = get_active_ads(&api, "act_1", "bad").await.unwrap_err();
        assert!(matches!(err, InsightsError::MetaApiError(_)));
        assert!(err.to_string().contains("Invalid OAuth access token"));
    }
}
