//! Chat completion gateway
//!
//! Forwards the full conversation to an OpenAI-compatible chat completions
//! endpoint. Connection resets are retried per [`RetryPolicy`]; everything
//! else is returned to the caller untouched.

pub mod retry;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

pub use retry::{RetryPolicy, is_connection_reset, with_retry};

use crate::conversation::ConversationTurn;
use crate::{Error, Result};

/// Default upstream base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default completion model
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Maximum response length sent with every request
pub const MAX_TOKENS: u32 = 1200;

/// Sampling temperature sent with every request
pub const TEMPERATURE: f32 = 0.7;

/// Produces the next assistant message for a conversation
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Complete the conversation, returning the raw assistant text
    ///
    /// # Errors
    ///
    /// Returns error if the upstream call fails after retries
    async fn complete(&self, turns: &[ConversationTurn]) -> Result<String>;
}

/// Chat completions client for the `OpenAI` API
#[derive(Debug, Clone)]
pub struct OpenAiCompletion {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ConversationTurn],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiCompletion {
    /// Create a new completion client
    ///
    /// # Errors
    ///
    /// Returns error if API key is empty
    pub fn new(api_key: SecretString) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for chat completions".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Override the upstream base URL (no trailing slash)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the model identifier
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single upstream call without retries
    async fn send_once(&self, turns: &[ConversationTurn]) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: turns,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamRejected { status, body });
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            if is_connection_reset(&e) {
                Error::TransportReset(e.to_string())
            } else {
                Error::MalformedResponse(e.to_string())
            }
        })?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::MalformedResponse("no choices in completion response".to_string()))
    }
}

#[async_trait]
impl CompletionGateway for OpenAiCompletion {
    async fn complete(&self, turns: &[ConversationTurn]) -> Result<String> {
        tracing::debug!(model = %self.model, turns = turns.len(), "requesting completion");
        with_retry(&self.retry, || self.send_once(turns)).await
    }
}

/// Map a reqwest send error to a transport reset when appropriate
fn classify_transport(err: reqwest::Error) -> Error {
    if is_connection_reset(&err) {
        Error::TransportReset(err.to_string())
    } else {
        Error::Http(err)
    }
}
