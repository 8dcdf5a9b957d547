//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use crate::config::LlmConfig;
use crate::error::{Result, WhisperError};
use crate::llm::{LlmClient, LlmProvider, MockLlmClient, OpenAiClient, OpenAiConfig};

/// Creates an LLM client for the given provider.
///
/// The API key comes from `OPENAI_API_KEY` or `GROQ_API_KEY`. The model is
/// resolved in order:
/// 1. `model` in the `[llm]` config section (or `--model`)
/// 2. `OPENAI_MODEL` / `GROQ_MODEL`
/// 3. The provider default (`gpt-3.5-turbo` / `mixtral-8x7b-32768`)
pub fn create_client(provider: LlmProvider, config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    let (key_var, model_var) = match provider {
        LlmProvider::OpenAi => ("OPENAI_API_KEY", "OPENAI_MODEL"),
        LlmProvider::Groq => ("GROQ_API_KEY", "GROQ_MODEL"),
        LlmProvider::Mock => return Ok(Box::new(MockLlmClient::new())),
    };

    let key = std::env::var(key_var)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| WhisperError::llm(format!("No API key configured. Set {key_var}.")))?;

    let model = config
        .model
        .clone()
        .or_else(|| std::env::var(model_var).ok())
        .unwrap_or_else(|| provider.default_model().to_string());

    let openai_config = match provider {
        LlmProvider::Groq => OpenAiConfig::groq(key, model),
        _ => OpenAiConfig::new(key, model),
    };
    let openai_config = match &config.base_url {
        Some(url) => openai_config.with_base_url(url),
        None => openai_config,
    }
    .with_timeout(config.timeout_secs);

    tracing::debug!(
        provider = %provider,
        model = %openai_config.model,
        "Creating LLM client"
    );

    Ok(Box::new(OpenAiClient::new(openai_config)?))
}
