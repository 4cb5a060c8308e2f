//! OpenAI-compatible chat-completions client for the correction backends.
//!
//! OpenAI and OpenRouter expose the same `/chat/completions` wire format,
//! so one client covers both; the constructors differ only in endpoint,
//! provider name, and which credential the factory resolved. The request
//! is a single user message carrying the fixed correction instruction and
//! the batch text — no system turn, no conversation state, each batch
//! stands alone.

use crate::error::ServiceError;
use crate::prompts::correction_prompt;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

use super::CorrectionService;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

// ── Wire format ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    /// Null for some reasoning models mid-failure; treated as empty.
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

// ── Client ───────────────────────────────────────────────────────────────

/// Chat-completions client instantiated for one provider.
pub struct ChatCompletionsService {
    http_client: reqwest::Client,
    endpoint: &'static str,
    provider_name: &'static str,
    api_key: String,
    model: String,
    instruction: String,
    temperature: f32,
}

/// Staged construction for [`ChatCompletionsService`].
///
/// Split from the service because building the HTTP client can fail; the
/// factory in [`super::build_service`] maps that failure to a fatal
/// configuration error.
pub struct ChatServiceBuilder {
    endpoint: &'static str,
    provider_name: &'static str,
    api_key: String,
    model: String,
    instruction: String,
    temperature: f32,
    timeout_secs: u64,
}

impl ChatCompletionsService {
    /// Client for the OpenAI API.
    pub fn openai(api_key: String, model: String) -> ChatServiceBuilder {
        ChatServiceBuilder::new(OPENAI_API_URL, "openai", api_key, model)
    }

    /// Client for the OpenRouter API.
    pub fn openrouter(api_key: String, model: String) -> ChatServiceBuilder {
        ChatServiceBuilder::new(OPENROUTER_API_URL, "openrouter", api_key, model)
    }
}

impl ChatServiceBuilder {
    fn new(
        endpoint: &'static str,
        provider_name: &'static str,
        api_key: String,
        model: String,
    ) -> Self {
        Self {
            endpoint,
            provider_name,
            api_key,
            model,
            instruction: crate::prompts::CORRECTION_INSTRUCTION.to_string(),
            temperature: 0.2,
            timeout_secs: 30,
        }
    }

    pub fn with_instruction(mut self, instruction: String) -> Self {
        self.instruction = instruction;
        self
    }

    pub fn with_temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Build the service, constructing the timeout'd HTTP client.
    pub fn build(self) -> Result<ChatCompletionsService, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(ChatCompletionsService {
            http_client,
            endpoint: self.endpoint,
            provider_name: self.provider_name,
            api_key: self.api_key,
            model: self.model,
            instruction: self.instruction,
            temperature: self.temperature,
        })
    }
}

#[async_trait]
impl CorrectionService for ChatCompletionsService {
    fn name(&self) -> &'static str {
        self.provider_name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn correct(&self, text: &str) -> Result<String, ServiceError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: correction_prompt(&self.instruction, text),
            }],
            temperature: self.temperature,
        };

        let start = Instant::now();
        let response = self
            .http_client
            .post(self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::Timeout {
                        secs: start.elapsed().as_secs(),
                    }
                } else {
                    ServiceError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| ServiceError::Malformed {
            detail: format!("invalid JSON body: {e}"),
        })?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "{}: {} tokens in, {} tokens out, {:?}",
                self.provider_name,
                usage.prompt_tokens,
                usage.completion_tokens,
                start.elapsed()
            );
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(ServiceError::Malformed {
                detail: "response carried no choices".to_string(),
            })?
            .message
            .content
            .unwrap_or_default();

        let corrected = content.trim();
        if corrected.is_empty() {
            return Err(ServiceError::EmptyResponse);
        }
        Ok(corrected.to_string())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}…")
    }
}
