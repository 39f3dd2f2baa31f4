use super::{ApiResponse, GraphApi, QueryParams};
use crate::config::MetaApiConfig;
use crate::error::{InsightsError, InsightsResult};
use async_trait::async_trait;
use rand::Rng;
use reqwest::StatusCode;
use std::time::Duration;

/// Graph API client with retry and exponential backoff
pub struct MetaApiClient {
    http: reqwest::Client,
    config: MetaApiConfig,
}

/// Outcome of a single HTTP attempt
enum Attempt {
    Done(ApiResponse),
    Retry(InsightsError),
}

impl MetaApiClient {
    pub fn new(config: MetaApiConfig) -> InsightsResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| InsightsError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    async fn attempt(&self, url: &str, params: &QueryParams) -> InsightsResult<Attempt> {
        let response = match self.http.get(url).query(params).send().await {
            Ok(response) => response,
            Err(e) if is_retryable_error(&e) => {
                return Ok(Attempt::Retry(InsightsError::NetworkError(e.to_string())))
            }
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        if status.is_success() {
            let page = response.json::<ApiResponse>().await?;
            return Ok(Attempt::Done(page));
        }

        let body = response.text().await.unwrap_or_default();
        let error = InsightsError::MetaApiStatus {
            status: status.as_u16(),
            body,
        };
        if is_retryable_status(status) {
            Ok(Attempt::Retry(error))
        } else {
            Err(error)
        }
    }
}

#[async_trait]
impl GraphApi for MetaApiClient {
    async fn fetch_data(&self, endpoint: &str, params: &QueryParams) -> InsightsResult<ApiResponse> {
        let url = self.url(endpoint);
        let max_retries = self.config.max_retries;
        let mut retry = 0;

        loop {
            let error = match self.attempt(&url, params).await? {
                Attempt::Done(page) => return Ok(page),
                Attempt::Retry(error) => error,
            };

            if retry >= max_retries {
                tracing::error!(
                    target: "meta::client",
                    "Error fetching data from {}: {}",
                    endpoint,
                    error
                );
                return Err(error);
            }

            retry += 1;
            let delay = backoff_delay(retry, self.config.retry_base_delay_ms);
            tracing::warn!(
                target: "meta::client",
                "Retry {}/{} for GET {} after {}ms: {}",
                retry,
                max_retries,
                endpoint,
                delay.as_millis(),
                error
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Network failures and timeouts are worth another attempt
fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request()
}

/// 5xx and 429 are retried, every other status is final
pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// `2^retry * base_ms` plus up to `base_ms` of jitter
pub(crate) fn backoff_delay(retry: u32, base_ms: u64) -> Duration {
    let base = base_ms.saturating_mul(1u64 << retry.min(16));
    let jitter = if base_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..base_ms)
    };
    Duration::from_millis(base.saturating_add(jitter))
}
