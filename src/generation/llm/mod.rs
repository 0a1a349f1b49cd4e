//! Text-generation providers
//!
//! Two wire formats cover the supported backends: OpenAI-compatible chat
//! completions (openai, groq, ollama) and Anthropic messages.

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

use crate::config::LlmConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by a text-generation backend
#[derive(Error, Debug)]
pub enum LlmError {
    /// API error from provider
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network/connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Response parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Rate limited
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },
}

impl LlmError {
    /// Classify a non-success HTTP response
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => LlmError::AuthenticationFailed { reason: message },
            429 => LlmError::RateLimited(message),
            _ => LlmError::Api { status, message },
        }
    }
}

/// Core trait for text-generation providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a single-turn completion request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Get the provider name
    fn name(&self) -> &str;
}

/// Single-turn completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: usize,
    pub temperature: Option<f32>,
    /// Ask the backend for a bare JSON object where it supports that
    pub json_output: bool,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            prompt: prompt.into(),
            max_tokens: 2048,
            temperature: None,
            json_output: false,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = max;
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// Text returned by a provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub model: String,
    pub text: String,
}

/// Default API base for each OpenAI-compatible provider name
fn default_base_url(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("https://api.openai.com/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        _ => None,
    }
}

/// Build the provider selected by `[llm]`
pub fn build_llm_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.provider.as_str() {
        "anthropic" => {
            let mut provider = AnthropicProvider::from_env(&config.api_key_env)?;
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url);
            }
            Ok(Arc::new(provider))
        }
        name => {
            let default_base = default_base_url(name).ok_or_else(|| {
                LlmError::Configuration(format!("Unknown LLM provider: {}", name))
            })?;
            let base_url = config.base_url.as_deref().unwrap_or(default_base);

            // A local ollama server needs no key
            let api_key = match std::env::var(&config.api_key_env) {
                Ok(key) => Some(key),
                Err(_) if name == "ollama" => None,
                Err(_) => {
                    return Err(LlmError::Configuration(format!(
                        "{} not set",
                        config.api_key_env
                    )))
                }
            };

            Ok(Arc::new(OpenAiProvider::new(name, base_url, api_key)))
        }
    }
}
