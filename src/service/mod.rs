//! The correction service: batch text in, corrected text out.
//!
//! The Corrector only depends on the [`CorrectionService`] contract, which
//! makes the backend swappable without touching retry or batching logic
//! and lets tests inject scripted fakes. The two real backends both speak
//! the OpenAI chat-completions wire format, so a single
//! [`chat::ChatCompletionsService`] client serves both; selecting a
//! [`CorrectionProvider`](crate::config::CorrectionProvider) picks an
//! endpoint, a credential source, and a default model.

pub mod chat;

use crate::config::{CorrectionProvider, RunConfig};
use crate::error::{ServiceError, ShuddhiError};
use async_trait::async_trait;
use std::sync::Arc;

pub use chat::ChatCompletionsService;

/// One correction backend.
///
/// Implementations must reject responses that are empty after trimming
/// ([`ServiceError::EmptyResponse`]); accepting one would silently drop a
/// batch of source text from the output artifact.
#[async_trait]
pub trait CorrectionService: Send + Sync {
    /// Stable provider name for logs and summaries.
    fn name(&self) -> &'static str;

    /// Model identifier submitted with each request.
    fn model(&self) -> &str;

    /// Correct one batch of raw OCR text.
    async fn correct(&self, text: &str) -> Result<String, ServiceError>;
}

/// Construct the configured correction backend.
///
/// Credential resolution: explicit `config.api_key` first, then the
/// provider's environment variable. Fails fast with a
/// [`ShuddhiError::ProviderNotConfigured`] hint so a missing key surfaces
/// before any rendering or OCR work is done.
pub fn build_service(config: &RunConfig) -> Result<Arc<dyn CorrectionService>, ShuddhiError> {
    let provider = config.provider;
    let api_key = config
        .api_key
        .clone()
        .or_else(|| std::env::var(provider.key_env_var()).ok())
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ShuddhiError::ProviderNotConfigured {
            provider: provider.name().to_string(),
            hint: format!(
                "Set {} or pass api_key in the config.",
                provider.key_env_var()
            ),
        })?;

    let model = config
        .model
        .clone()
        .unwrap_or_else(|| provider.default_model().to_string());

    let instruction = config
        .instruction
        .clone()
        .unwrap_or_else(|| crate::prompts::CORRECTION_INSTRUCTION.to_string());

    let service = match provider {
        CorrectionProvider::OpenAi => ChatCompletionsService::openai(api_key, model),
        CorrectionProvider::OpenRouter => ChatCompletionsService::openrouter(api_key, model),
    }
    .with_instruction(instruction)
    .with_temperature(config.temperature)
    .with_timeout_secs(config.api_timeout_secs)
    .build()
    .map_err(|e| ShuddhiError::ProviderNotConfigured {
        provider: provider.name().to_string(),
        hint: format!("HTTP client construction failed: {e}"),
    })?;

    Ok(Arc::new(service))
}
