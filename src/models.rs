//! Domain models shared by the Meta collaborators, the analysis helpers and
//! the pipeline steps.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Performance metrics of a single Meta ad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdMetrics {
    pub ad_id: String,
    pub ad_name: String,
    pub campaign_name: String,
    pub is_active: bool,
    pub spend: f64,
    pub revenue: f64,
    pub roas: f64,
    pub is_carousel: bool,
    pub image_hashes: Vec<String>,
    pub video_hashes: Vec<String>,
}

/// Ad metrics enriched with resolved creative image URLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdMetricsWithImages {
    #[serde(flatten)]
    pub metrics: AdMetrics,
    pub image_urls: Vec<String>,
}

impl AdMetricsWithImages {
    pub fn new(metrics: AdMetrics, image_urls: Vec<String>) -> Self {
        Self {
            metrics,
            image_urls,
        }
    }

    pub fn ad_id(&self) -> &str {
        &self.metrics.ad_id
    }

    pub fn revenue(&self) -> f64 {
        self.metrics.revenue
    }

    pub fn has_images(&self) -> bool {
        !self.image_urls.is_empty()
    }
}

/// Brand category assigned to a set of ads by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrandType {
    Beauty,
    Shoes,
    Fitness,
    Fmcg,
    Apparel,
    Electronics,
    Food,
    Jewelry,
    Home,
    Other,
}

impl BrandType {
    pub const ALL: [BrandType; 10] = [
        BrandType::Beauty,
        BrandType::Shoes,
        BrandType::Fitness,
        BrandType::Fmcg,
        BrandType::Apparel,
        BrandType::Electronics,
        BrandType::Food,
        BrandType::Jewelry,
        BrandType::Home,
        BrandType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BrandType::Beauty => "beauty",
            BrandType::Shoes => "shoes",
            BrandType::Fitness => "fitness",
            BrandType::Fmcg => "fmcg",
            BrandType::Apparel => "apparel",
            BrandType::Electronics => "electronics",
            BrandType::Food => "food",
            BrandType::Jewelry => "jewelry",
            BrandType::Home => "home",
            BrandType::Other => "other",
        }
    }

    /// Parse a label case-insensitively; anything unknown is `Other`
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|brand| brand.as_str() == label)
            .unwrap_or(BrandType::Other)
    }
}

impl fmt::Display for BrandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured "what's working / what's not" output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    pub whats_working: Vec<String>,
    pub whats_not_working: Vec<String>,
    pub recommendations: String,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Build an ad with the given id, revenue and image URLs
    pub fn ad(id: &str, revenue: f64, image_urls: &[&str]) -> AdMetricsWithImages {
        AdMetricsWithImages::new(
            AdMetrics {
                ad_id: id.to_string(),
                ad_name: format!("Ad {}", id),
                campaign_name: "Spring Sale".to_string(),
                is_active: true,
                spend: 10.0,
                revenue,
                roas: revenue / 10.0,
                is_carousel: image_urls.len() > 1,
                image_hashes: image_urls.iter().map(|u| format!("hash-{}", u)).collect(),
                video_hashes: Vec::new(),
            },
            image_urls.iter().map(|u| u.to_string()).collect(),
        )
    }
}
