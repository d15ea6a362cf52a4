//! Chat-completion client for transcript summarization
//!
//! Provides a `CompletionBackend` trait with one implementation:
//! - **Groq** — OpenAI-compatible `/chat/completions` endpoint
//!
//! Each call is a single request. Failures are returned to the caller as-is;
//! nothing here retries.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::CompletionConfig;
use crate::models::ChatMessage;

// ============================================================================
// CompletionBackend trait
// ============================================================================

/// Abstraction over chat-completion providers.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run one completion. Returns `None` when the provider answered without
    /// any content (no choices, or an empty message).
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>, CompletionError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Missing API key")]
    MissingApiKey,
}

// ============================================================================
// Groq API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ============================================================================
// GroqCompletionClient
// ============================================================================

/// Groq completion client — calls the OpenAI-compatible chat completions API.
#[derive(Debug, Clone)]
pub struct GroqCompletionClient {
    client: Client,
    config: CompletionConfig,
    base_url: String,
}

impl GroqCompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let base_url = config.base_url.clone();
        Self::with_base_url(config, base_url)
    }

    /// Create a client with a custom base URL (for testing / integration)
    pub fn with_base_url(
        config: CompletionConfig,
        base_url: String,
    ) -> Result<Self, CompletionError> {
        if config.api_key.is_empty() {
            return Err(CompletionError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl CompletionBackend for GroqCompletionClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatCompletionRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            messages,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(error_body);

            tracing::error!(code = status.as_u16(), message = %message, "Groq API error");

            return Err(CompletionError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        tracing::debug!(
            model = %self.config.model,
            empty = content.is_none(),
            "Completion received"
        );

        Ok(content)
    }

    fn name(&self) -> &str {
        "groq"
    }
}

// ============================================================================
// TESTS
// ============================================================================
