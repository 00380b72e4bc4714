//! Chat completion client
//!
//! Talks to an OpenAI-compatible `/chat/completions` endpoint. Requests are
//! rate limited with a token bucket so a long batch never exceeds the
//! configured requests per minute, however fast the host ticks.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;

/// Rating transport errors
///
/// Every variant counts as a transient service failure for retry purposes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaterError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Response contained no message content")]
    EmptyResponse,
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Anything that can answer a chat completion request
///
/// The production implementation is [`ChatCompletionClient`]; tests plug in
/// scripted backends.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send `request`, return the first choice's message text
    async fn complete(&self, request: &ChatRequest) -> Result<String, RaterError>;
}

/// HTTP chat completion client
pub struct ChatCompletionClient {
    /// HTTP client with configured timeouts
    client: Client,
    /// Base URL, e.g. `https://api.deepseek.com`
    base_url: String,
    /// Bearer token
    api_key: String,
    /// Token bucket sized from requests per minute
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl ChatCompletionClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        requests_per_minute: u32,
    ) -> Result<Self, RaterError> {
        let client = Client::builder()
            .user_agent(comprank_common::config::get_user_agent())
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| RaterError::Network(e.to_string()))?;

        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_minute(per_minute));

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            rate_limiter,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ChatBackend for ChatCompletionClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, RaterError> {
        // Wait for rate limiter permit
        self.rate_limiter.until_ready().await;

        tracing::debug!(model = %request.model, url = %self.endpoint(), "Sending chat completion request");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| RaterError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(RaterError::Api(status.as_u16(), error_text));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| RaterError::Parse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(RaterError::EmptyResponse)
    }
}
