use super::{ModelInvoker, ModelRequest, OutputSchema};
use crate::config::ModelConfig;
use crate::error::{InsightsError, InsightsResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Azure OpenAI chat-completions client
///
/// Structured output uses function calling: the schema is sent as the only
/// tool and the model is forced to call it.
pub struct AzureOpenAiClient {
    http: reqwest::Client,
    config: ModelConfig,
    completions_url: Url,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    arguments: String,
}

impl AzureOpenAiClient {
    /// Create a client; fails if no API key is configured
    pub fn new(config: ModelConfig) -> InsightsResult<Self> {
        if config.api_key.is_none() {
            return Err(InsightsError::ConfigError(
                "OpenAI API key is required. Set OPENAI_API_KEY environment variable.".to_string(),
            ));
        }
        let completions_url = Self::build_completions_url(&config)?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| InsightsError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            config,
            completions_url,
        })
    }

    fn build_completions_url(config: &ModelConfig) -> InsightsResult<Url> {
        let base = format!(
            "{}/openai/deployments/{}/chat/completions",
            config.endpoint.trim_end_matches('/'),
            config.deployment
        );
        let mut url = Url::parse(&base).map_err(|e| {
            InsightsError::ConfigError(format!("Invalid Azure OpenAI endpoint: {}", e))
        })?;
        url.query_pairs_mut()
            .append_pair("api-version", &config.api_version);
        Ok(url)
    }

    fn request_body(&self, request: &ModelRequest, schema: Option<&OutputSchema>) -> Value {
        let mut body = json!({
            "messages": request.messages,
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "temperature": self.config.temperature,
            "frequency_penalty": 0,
            "presence_penalty": 0,
        });
        if let Some(schema) = schema {
            body["tools"] = json!([{
                "type": "function",
                "function": {
                    "name": schema.name,
                    "description": schema.description,
                    "parameters": schema.parameters,
                }
            }]);
            body["tool_choice"] = json!({
                "type": "function",
                "function": { "name": schema.name }
            });
        }
        body
    }

    /// Single request without retries
    async fn send(&self, body: &Value) -> InsightsResult<ChatCompletion> {
        let api_key = self.config.api_key.as_deref().unwrap_or_default();
        let response = self
            .http
            .post(self.completions_url.clone())
            .header("api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                InsightsError::ModelRequestFailed(format!("Error in calling AI Model: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(InsightsError::ModelRequestFailed(format!(
                "Error in calling AI Model: status {} - {}",
                status.as_u16(),
                text
            )));
        }

        Ok(response.json::<ChatCompletion>().await?)
    }
}

#[async_trait]
impl ModelInvoker for AzureOpenAiClient {
    async fn request_string_output(&self, request: &ModelRequest) -> InsightsResult<String> {
        let body = &self.request_body(request, None);
        with_retries(
            "string output",
            self.config.max_attempts,
            self.config.retry_delay(),
            move || async move {
                let completion = self.send(body).await?;
                extract_content(&completion)
            },
        )
        .await
    }

    async fn request_structured_output(
        &self,
        request: &ModelRequest,
        schema: &OutputSchema,
    ) -> InsightsResult<Value> {
        let body = &self.request_body(request, Some(schema));
        with_retries(
            &schema.name,
            self.config.max_attempts,
            self.config.retry_delay(),
            move || async move {
                let completion = self.send(body).await?;
                parse_tool_call(&completion)
            },
        )
        .await
    }
}

/// Text content of the first choice; empty content is an error
pub(crate) fn extract_content(completion: &ChatCompletion) -> InsightsResult<String> {
    completion
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .filter(|content| !content.is_empty())
        .ok_or(InsightsError::EmptyModelResponse)
}

/// Arguments of the first tool call, parsed as JSON
pub(crate) fn parse_tool_call(completion: &ChatCompletion) -> InsightsResult<Value> {
    let call = completion
        .choices
        .first()
        .and_then(|choice| choice.message.tool_calls.as_ref())
        .and_then(|calls| calls.first())
        .ok_or(InsightsError::MissingToolCall)?;
    Ok(serde_json::from_str(&call.function.arguments)?)
}

/// Run `op` up to `max_attempts` times, sleeping `delay` between failures
pub(crate) async fn with_retries<T, F, Fut>(
    label: &str,
    max_attempts: u32,
    delay: Duration,
    mut op: F,
) -> InsightsResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = InsightsResult<T>>,
{
    let mut attempts = 0;
    let mut last_error = String::from("Unknown error");

    while attempts < max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                attempts += 1;
                last_error = e.to_string();
                tracing::warn!(
                    target: "genai::openai",
                    "Attempt {}/{} for {} failed: {}",
                    attempts,
                    max_attempts,
                    label,
                    last_error
                );
                if attempts < max_attempts && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(InsightsError::ModelRetriesExhausted {
        attempts,
        last_error,
    })
}
