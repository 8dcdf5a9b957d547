//! OpenAI-compatible chat completions client.
//!
//! Talks to OpenAI and to providers exposing the same API (Groq).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, WhisperError};
use crate::llm::types::Message;
use crate::llm::LlmClient;

/// OpenAI API endpoint.
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Groq's OpenAI-compatible endpoint.
pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// OpenAI client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model to use (e.g., "gpt-3.5-turbo").
    pub model: String,
    /// Chat completions endpoint.
    pub base_url: String,
    /// Request timeout in seconds. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    /// Sampling temperature. `None` leaves the provider default.
    pub temperature: Option<f32>,
    /// Name used in error messages.
    pub provider_name: &'static str,
    /// Environment variable the key is read from, for error hints.
    pub key_var: &'static str,
}

impl OpenAiConfig {
    /// Creates a config for the OpenAI API.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_API_URL.to_string(),
            timeout_secs: None,
            temperature: None,
            provider_name: "OpenAI",
            key_var: "OPENAI_API_KEY",
        }
    }

    /// Creates a config for Groq, sampled at temperature 0.
    pub fn groq(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: GROQ_API_URL.to_string(),
            temperature: Some(0.0),
            provider_name: "Groq",
            key_var: "GROQ_API_KEY",
            ..Self::new(api_key, model)
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Overrides the endpoint URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// OpenAI-compatible LLM client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| WhisperError::llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Converts internal messages to the wire format.
    fn convert_messages(messages: &[Message]) -> Vec<OpenAiMessage> {
        messages
            .iter()
            .map(|m| OpenAiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Turns a non-success response into an error.
    fn parse_error(&self, status: reqwest::StatusCode, body: &str) -> WhisperError {
        let provider = self.config.provider_name;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return WhisperError::llm(format!(
                "Authentication failed. Check your {}.",
                self.config.key_var
            ));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return WhisperError::llm("Rate limited. Please wait and try again.");
        }

        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            return WhisperError::llm(format!(
                "{} API error: {}",
                provider, error_response.error.message
            ));
        }

        WhisperError::llm(format!("{} API error ({}): {}", provider, status, body))
    }

    /// Extracts the first choice's text from a success body.
    fn parse_completion(&self, body: &str) -> Result<String> {
        let response: OpenAiResponse = serde_json::from_str(body)
            .map_err(|e| WhisperError::llm(format!("Failed to parse response: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                WhisperError::llm(format!("No response from {}", self.config.provider_name))
            })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let request = OpenAiRequest {
            model: self.config.model.clone(),
            messages: Self::convert_messages(messages),
            temperature: self.config.temperature,
        };

        debug!(
            provider = self.config.provider_name,
            model = %self.config.model,
            messages = messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&self.config.base_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WhisperError::llm("Request timed out. Try again.")
                } else if e.is_connect() {
                    WhisperError::llm(format!(
                        "Failed to connect to {} API. Check your network.",
                        self.config.provider_name
                    ))
                } else {
                    WhisperError::llm(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WhisperError::llm(format!("Failed to read response: {}", e)))?;

        if status.is_success() {
            self.parse_completion(&body)
        } else {
            Err(self.parse_error(status, &body))
        }
    }
}

// Wire types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}
