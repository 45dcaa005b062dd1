//! HTTP client for the gateway's chat and TTS endpoints

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Body of a `/api/chat` request
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub language: String,
    pub is_interruption: bool,
}

/// Server side of one exchange, as seen by the chat client
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send a message and return the assistant reply
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the server reports an error
    async fn chat(&self, payload: &ChatPayload) -> Result<String>;

    /// Synthesize reply text, returning base64 MP3
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the server reports an error
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<String>;
}

/// Talks to a running gateway over HTTP, keeping its session cookie
#[derive(Debug, Clone)]
pub struct ChatApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ChatReply {
    message: Option<String>,
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TtsPayload<'a> {
    message: &'a str,
    language_code: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TtsReply {
    audio_content: Option<String>,
    error: Option<String>,
}

impl ChatApi {
    /// Create a client for the gateway at `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ChatBackend for ChatApi {
    async fn chat(&self, payload: &ChatPayload) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let reply: ChatReply = response.json().await?;

        match (status.is_success(), reply.message, reply.error) {
            (true, Some(message), _) => Ok(message),
            (true, None, _) => Err(Error::MalformedResponse("chat reply without message".to_string())),
            (false, _, error) => Err(Error::UpstreamRejected {
                status: status.as_u16(),
                body: error.unwrap_or_default(),
            }),
        }
    }

    async fn synthesize(&self, text: &str, language_code: &str) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/api/tts", self.base_url))
            .json(&TtsPayload {
                message: text,
                language_code,
            })
            .send()
            .await?;

        let status = response.status();
        let reply: TtsReply = response.json().await?;

        match (status.is_success(), reply.audio_content, reply.error) {
            (true, Some(audio), _) => Ok(audio),
            (true, None, _) => Err(Error::MalformedResponse("tts reply without audio".to_string())),
            (false, _, error) => Err(Error::UpstreamRejected {
                status: status.as_u16(),
                body: error.unwrap_or_default(),
            }),
        }
    }
}
