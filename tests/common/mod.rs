//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use companion_gateway::{
    ApiServerBuilder, CompletionGateway, ConversationTurn, Error, Result, SpeechSynthesizer,
};

/// Completion gateway that replays scripted replies and records every call
#[derive(Default)]
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<Vec<ConversationTurn>>>,
}

impl ScriptedCompletion {
    pub fn replying(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| Ok((*r).to_string())).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Err(Error::TransportReset(
                "connection reset by peer".to_string(),
            ))])),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Conversations sent to the gateway, one per call
    pub fn calls(&self) -> Vec<Vec<ConversationTurn>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedCompletion {
    async fn complete(&self, turns: &[ConversationTurn]) -> Result<String> {
        self.calls.lock().unwrap().push(turns.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }
}

/// Synthesizer returning fixed audio, or failing on demand
pub struct FixedTts {
    pub audio: Option<String>,
    pub requests: Mutex<Vec<(String, String)>>,
}

impl FixedTts {
    pub fn returning(audio: &str) -> Arc<Self> {
        Arc::new(Self {
            audio: Some(audio.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            audio: None,
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for FixedTts {
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<String> {
        self.requests
            .lock()
            .unwrap()
            .push((text.to_string(), language_code.to_string()));
        self.audio.clone().ok_or_else(|| {
            Error::Tts(Box::new(Error::UpstreamRejected {
                status: 403,
                body: "forbidden".to_string(),
            }))
        })
    }
}

/// Build the full gateway router over the given collaborators
pub fn build_test_router(
    completion: Arc<dyn CompletionGateway>,
    tts: Arc<dyn SpeechSynthesizer>,
    static_dir: &Path,
) -> axum::Router {
    ApiServerBuilder::new(completion, tts, 0)
        .static_dir(static_dir.to_path_buf())
        .build()
        .router()
}

/// JSON POST request, optionally carrying a cookie header
pub fn post_json(uri: &str, body: &serde_json::Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Read a response body as JSON
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// `name=value` part of the response's `set-cookie` header
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(ToString::to_string)
}
