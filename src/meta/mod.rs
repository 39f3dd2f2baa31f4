//! Meta (Facebook) Graph API access
//!
//! [`GraphApi`] is the raw HTTP seam, [`AdsMetricsProvider`] is what the
//! pipeline consumes. [`MetaAdsWithImagesService`] joins the two: it pulls
//! active ads, extracts their metrics and resolves creative image URLs.

pub mod client;
pub mod images;
pub mod mock;
pub mod performance;

pub use client::MetaApiClient;
pub use images::MetaAdsWithImagesService;
pub use mock::MockAdsProvider;

use crate::error::InsightsResult;
use crate::models::AdMetricsWithImages;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query string parameters of a Graph API request
pub type QueryParams = Vec<(String, String)>;

/// One page of a Graph API edge
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

impl ApiResponse {
    /// Cursor of the next page, if the API reported one
    pub fn next_cursor(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|paging| paging.cursors.as_ref())
            .and_then(|cursors| cursors.after.as_deref())
            .filter(|after| !after.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub cursors: Option<Cursors>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cursors {
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageStats {
    pub total_pages: u32,
    pub successful_pages: u32,
    pub failed_pages: u32,
}

/// Items collected across pages
#[derive(Debug, Clone, Default)]
pub struct PaginationResult {
    pub items: Vec<Value>,
    pub stats: PageStats,
    /// Error that ended pagination early, if any
    pub last_error: Option<String>,
}

/// Raw Graph API access
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// GET a single page of `endpoint`
    async fn fetch_data(&self, endpoint: &str, params: &QueryParams) -> InsightsResult<ApiResponse>;

    /// Follow `after` cursors until a page is empty or has no cursor
    ///
    /// A failed page ends pagination; whatever was collected before it is
    /// returned together with the failure count.
    async fn fetch_paginated_data(&self, endpoint: &str, params: &QueryParams) -> PaginationResult {
        let mut result = PaginationResult::default();
        let mut after: Option<String> = None;

        loop {
            result.stats.total_pages += 1;
            let page = result.stats.total_pages;

            let mut page_params = params.clone();
            if let Some(cursor) = &after {
                page_params.push(("after".to_string(), cursor.clone()));
            }
            tracing::debug!(target: "meta::client", "Fetching page {} from {}", page, endpoint);

            let response = match self.fetch_data(endpoint, &page_params).await {
                Ok(response) => response,
                Err(e) => {
                    result.stats.failed_pages += 1;
                    tracing::error!(
                        target: "meta::client",
                        "Failed to fetch page {} from {}: {}",
                        page,
                        endpoint,
                        e
                    );
                    result.last_error = Some(e.to_string());
                    break;
                }
            };

            if response.data.is_empty() {
                tracing::debug!(target: "meta::client", "Page {} returned no items", page);
                break;
            }

            let next = response.next_cursor().map(str::to_string);
            tracing::debug!(
                target: "meta::client",
                "Received {} items from page {}",
                response.data.len(),
                page
            );
            result.items.extend(response.data);
            result.stats.successful_pages += 1;

            match next {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        result
    }
}

/// Source of active ads enriched with image URLs
#[async_trait]
pub trait AdsMetricsProvider: Send + Sync {
    async fn get_active_ads_with_images(
        &self,
        account_id: &str,
        access_token: &str,
    ) -> InsightsResult<Vec<AdMetricsWithImages>>;
}
