use super::{ChatMessage, ModelInvoker, ModelRequest, OutputSchema};
use crate::error::{InsightsError, InsightsResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A request received by [`MockModelInvoker`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    /// Schema name for structured calls, `None` for string calls
    pub schema_name: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
}

impl RecordedCall {
    pub fn is_structured(&self) -> bool {
        self.schema_name.is_some()
    }

    /// All text sent in this call, messages joined by newlines
    pub fn prompt_text(&self) -> String {
        self.messages
            .iter()
            .map(ChatMessage::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn image_count(&self) -> usize {
        self.messages.iter().map(ChatMessage::image_count).sum()
    }
}

/// Scripted model invoker for tests and offline runs
///
/// Responses are queued per output kind and handed out in order. Every
/// request is recorded so callers can assert on the prompts that were sent.
pub struct MockModelInvoker {
    string_responses: Mutex<VecDeque<String>>,
    structured_responses: Mutex<VecDeque<Value>>,
    failure: Option<String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockModelInvoker {
    pub fn new() -> Self {
        Self {
            string_responses: Mutex::new(VecDeque::new()),
            structured_responses: Mutex::new(VecDeque::new()),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// An invoker whose every request fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new()
        }
    }

    pub fn with_string_response(self, response: impl Into<String>) -> Self {
        if let Ok(mut queue) = self.string_responses.lock() {
            queue.push_back(response.into());
        }
        self
    }

    pub fn with_structured_response(self, response: Value) -> Self {
        if let Ok(mut queue) = self.structured_responses.lock() {
            queue.push_back(response);
        }
        self
    }

    /// Snapshot of the calls received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    fn record(&self, request: &ModelRequest, schema: Option<&OutputSchema>) -> InsightsResult<()> {
        self.calls.lock()?.push(RecordedCall {
            schema_name: schema.map(|s| s.name.clone()),
            messages: request.messages.clone(),
            max_tokens: request.max_tokens,
        });
        match &self.failure {
            Some(message) => Err(InsightsError::ModelRequestFailed(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MockModelInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelInvoker for MockModelInvoker {
    async fn request_string_output(&self, request: &ModelRequest) -> InsightsResult<String> {
        self.record(request, None)?;
        self.string_responses.lock()?.pop_front().ok_or_else(|| {
            InsightsError::ModelRequestFailed("No scripted string response left".to_string())
        })
    }

    async fn request_structured_output(
        &self,
        request: &ModelRequest,
        schema: &OutputSchema,
    ) -> InsightsResult<Value> {
        self.record(request, Some(schema))?;
        self.structured_responses.lock()?.pop_front().ok_or_else(|| {
            InsightsError::ModelRequestFailed(format!(
                "No scripted structured response left for {}",
                schema.name
            ))
        })
    }
}
