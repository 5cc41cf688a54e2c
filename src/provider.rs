//! Chat-completion providers.
//!
//! [`ChatProvider`] is the single seam between the pipeline and the network.
//! [`GroqProvider`] talks to any OpenAI-compatible `/chat/completions`
//! endpoint (Groq by default); tests and library callers can plug in their
//! own implementation through
//! [`crate::config::ExtractionConfigBuilder::provider`].

use crate::config::{ApiKey, ExtractionConfig};
use crate::error::{ExtractError, ProviderError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// One message in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Request body: `{model, messages, temperature}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Something that can answer a chat-completion request with text.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Send one request and return `choices[0].message.content`.
    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError>;
}

/// OpenAI-compatible HTTP provider with bearer-token auth.
pub struct GroqProvider {
    client: reqwest::Client,
    api_key: ApiKey,
    endpoint: String,
}

impl GroqProvider {
    /// Build a provider with its own HTTP client.
    pub fn new(
        api_key: ApiKey,
        endpoint: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ExtractError> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder
            .build()
            .map_err(|e| ExtractError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, api_key, endpoint))
    }

    /// Build a provider around an existing client.
    pub fn with_client(client: reqwest::Client, api_key: ApiKey, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            endpoint: endpoint.into(),
        }
    }

    /// Provider described by `config` (key, endpoint, timeout).
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let key = config.api_key.clone().ok_or(ExtractError::MissingApiKey)?;
        Self::new(key, config.endpoint.clone(), config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatProvider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose())
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidBody(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                ProviderError::InvalidBody("missing choices[0].message.content".into())
            })?;

        debug!("{}: {} chars of completion", self.name(), content.len());
        Ok(content)
    }
}
