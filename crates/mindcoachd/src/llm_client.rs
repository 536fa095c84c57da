//! LLM client abstraction.
//!
//! A single `invoke` call against an OpenAI-compatible chat endpoint, plus a
//! scripted fake for tests. Callers never see *why* a call failed beyond the
//! error value; the AI service treats every error the same way.

use async_trait::async_trait;
use mindcoach_shared::ChatMessage;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use crate::config::LlmConfig;

/// One chat-completion call.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system_prompt: String,
    /// Conversation after the system prompt, oldest first.
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl LlmRequest {
    /// A system prompt followed by one user message.
    pub fn single(
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: vec![ChatMessage::user(user_prompt)],
            temperature,
            max_tokens,
            timeout,
        }
    }
}

/// LLM errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("LLM is not configured")]
    Disabled,

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("LLM returned empty response")]
    EmptyResponse,
}

/// Generic LLM client trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run one completion and return the raw assistant text.
    async fn invoke(&self, request: &LlmRequest) -> Result<String, LlmError>;
}

/// Real client for OpenAI-compatible `/chat/completions` endpoints
pub struct HttpLlmClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, request: &LlmRequest) -> serde_json::Value {
        let mut messages = vec![serde_json::json!({
            "role": "system",
            "content": request.system_prompt,
        })];
        messages.extend(request.messages.iter().map(|m| {
            serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content,
            })
        }));

        serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn invoke(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::Disabled)?;

        let timeout_secs = request.timeout.as_secs();
        debug!(
            "LLM call: model={}, messages={}, max_tokens={}",
            self.config.model,
            request.messages.len() + 1,
            request.max_tokens
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .timeout(request.timeout)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(timeout_secs)
                } else {
                    LlmError::HttpError(format!("Request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(LlmError::HttpError(format!(
                "HTTP {} from OpenAI-compatible API",
                response.status()
            )));
        }

        let response_json: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(timeout_secs)
            } else {
                LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
            }
        })?;

        extract_content(&response_json)
    }
}

/// Pull `choices[0].message.content` out of a chat-completion body.
fn extract_content(body: &serde_json::Value) -> Result<String, LlmError> {
    let text = body
        .get("choices")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("message"))
        .and_then(|v| v.get("content"))
        .and_then(|v| v.as_str())
        .ok_or(LlmError::EmptyResponse)?;

    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text.to_string())
}

/// Fake LLM client for testing
pub struct FakeLlmClient {
    responses: Mutex<Vec<Result<String, LlmError>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl FakeLlmClient {
    /// Create a fake client with pre-defined responses
    pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a fake client that always returns this text
    pub fn always_text(text: impl Into<String>) -> Self {
        Self::new(vec![Ok(text.into())])
    }

    /// Create a fake client that always returns an error
    pub fn always_error(error: LlmError) -> Self {
        Self::new(vec![Err(error)])
    }

    /// Get the number of calls made
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Requests seen so far, oldest first
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn invoke(&self, request: &LlmRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());

        let mut responses = self.responses.lock().unwrap();
        match responses.len() {
            0 => Err(LlmError::EmptyResponse),
            // Keep returning the last response
            1 => responses[0].clone(),
            _ => responses.remove(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> LlmRequest {
        LlmRequest::single("system", "user", 0.7, 200, Duration::from_secs(30))
    }

    #[test]
    fn test_request_body_shape() {
        let client = HttpLlmClient::new(LlmConfig::default()).unwrap();
        let body = client.request_body(&request());
        assert_eq!(body["model"], "qwen-plus");
        assert_eq!(body["max_tokens"], 200);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "user");
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let config = LlmConfig {
            base_url: "http://localhost:1234/v1/".to_string(),
            ..LlmConfig::default()
        };
        let client = HttpLlmClient::new(config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_extract_content() {
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "压力指数: 0.4"}}]
        });
        assert_eq!(extract_content(&body).unwrap(), "压力指数: 0.4");

        let empty = serde_json::json!({"choices": [{"message": {"content": "  "}}]});
        assert_eq!(extract_content(&empty), Err(LlmError::EmptyResponse));

        assert_eq!(
            extract_content(&serde_json::json!({"error": "bad key"})),
            Err(LlmError::EmptyResponse)
        );
    }

    #[tokio::test]
    async fn test_http_client_without_key_is_disabled() {
        let client = HttpLlmClient::new(LlmConfig::default()).unwrap();
        assert_eq!(client.invoke(&request()).await, Err(LlmError::Disabled));
    }

    #[tokio::test]
    async fn test_fake_client_always_text() {
        let client = FakeLlmClient::always_text("hello");
        assert_eq!(client.invoke(&request()).await.unwrap(), "hello");
        assert_eq!(client.invoke(&request()).await.unwrap(), "hello");
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_fake_client_multiple_responses() {
        let client = FakeLlmClient::new(vec![
            Ok("one".to_string()),
            Err(LlmError::Timeout(30)),
            Ok("three".to_string()),
        ]);

        assert_eq!(client.invoke(&request()).await.unwrap(), "one");
        assert_eq!(client.invoke(&request()).await, Err(LlmError::Timeout(30)));
        assert_eq!(client.invoke(&request()).await.unwrap(), "three");
        assert_eq!(client.call_count(), 3);
        assert_eq!(client.requests()[0].max_tokens, 200);
    }
}
