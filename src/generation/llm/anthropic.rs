//! Anthropic messages API provider

use super::{CompletionRequest, CompletionResponse, LlmError, LlmProvider};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

/// Anthropic API base URL
const API_BASE: &str = "https://api.anthropic.com/v1";

/// API version header value
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: API_BASE.to_string(),
        }
    }

    /// Create from the API key stored in `api_key_env`
    pub fn from_env(api_key_env: &str) -> Result<Self, LlmError> {
        let api_key = std::env::var(api_key_env)
            .map_err(|_| LlmError::Configuration(format!("{} not set", api_key_env)))?;
        Ok(Self::new(api_key))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| LlmError::Configuration(format!("Invalid API key: {}", e)))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(headers)
    }

    fn to_api_request<'a>(&self, request: &'a CompletionRequest) -> ApiRequest<'a> {
        ApiRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            system: request.system.as_deref(),
            messages: vec![ApiMessage {
                role: "user",
                content: &request.prompt,
            }],
            // Messages API caps temperature at 1.0
            temperature: request.temperature.map(|t| t.clamp(0.0, 1.0)),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let headers = self.build_headers()?;

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .headers(headers)
            .json(&self.to_api_request(&request))
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), error_body));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(CompletionResponse {
            model: api_response.model.clone(),
            text: api_response.into_text(),
        })
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    content: Vec<ApiContent>,
}

impl ApiResponse {
    /// Text blocks joined in order; empty when the reply has none
    fn into_text(self) -> String {
        self.content
            .into_iter()
            .filter_map(|block| match block {
                ApiContent::Text { text } => Some(text),
                ApiContent::Other => None,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContent {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_clamped() {
        let provider = AnthropicProvider::new("test-key");
        let request = CompletionRequest::new("claude-3-5-haiku-latest", "hi").with_temperature(1.4);
        let body = serde_json::to_value(provider.to_api_request(&request)).unwrap();
        assert_eq!(body["temperature"], 1.0);
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_response_text_blocks_joined() {
        let raw = r#"{
            "id": "msg_1",
            "model": "claude-3-5-haiku-latest",
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "{\"title\":"},
                {"type": "text", "text": "\"x\"}"}
            ]
        }"#;
        let parsed: ApiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.into_text(), r#"{"title":"x"}"#);
    }

    #[test]
    fn test_reply_without_text_block_is_empty_text() {
        let raw = r#"{
            "model": "claude-3-5-haiku-latest",
            "content": [{"type": "thinking", "thinking": "hmm"}]
        }"#;
        let parsed: ApiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.into_text(), "");
    }

    #[test]
    fn test_headers() {
        let headers = AnthropicProvider::new("k").build_headers().unwrap();
        assert_eq!(headers["anthropic-version"], API_VERSION);
        assert_eq!(headers["x-api-key"], "k");
    }
}
