//! Chat endpoint
//!
//! Resolves the caller's session from its cookie, runs one orchestrated
//! exchange and returns the assistant text. Synthesis is a separate call to
//! `/api/tts` made by the client.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use super::{ApiState, ErrorResponse};
use crate::orchestrator::UserMessage;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "companion_session";

/// User-facing message for any chat failure
pub const CHAT_APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// Build chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/chat", post(chat)).with_state(state)
}

/// Chat request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub is_interruption: bool,
}

/// Chat response body
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
}

/// Handle one chat exchange
async fn chat(
    State(state): State<Arc<ApiState>>,
    jar: CookieJar,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> (CookieJar, Result<Json<ChatResponse>, ChatError>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!(error = %rejection, "invalid chat request body");
            return (jar, Err(ChatError::BadRequest));
        }
    };

    let has_name = request.username.as_deref().is_some_and(|n| !n.is_empty());
    if request.message.trim().is_empty() && !has_name {
        return (jar, Err(ChatError::BadRequest));
    }

    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

    tracing::info!(
        has_session = token.is_some(),
        language = request.language.as_deref().unwrap_or_default(),
        interruption = request.is_interruption,
        "chat message received"
    );

    let message = UserMessage {
        text: request.message,
        display_name: request.username,
        is_interruption: request.is_interruption,
    };

    let exchange = state.orchestrator.handle(token.as_deref(), &message).await;

    let jar = if exchange.created {
        jar.add(session_cookie(exchange.session_id.clone()))
    } else {
        jar
    };

    let result = exchange
        .reply
        .map(|message| Json(ChatResponse { message }))
        .map_err(|e| {
            tracing::error!(session_id = %exchange.session_id, error = %e, "error in chat API");
            ChatError::CompletionFailed
        });

    (jar, result)
}

fn session_cookie(id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Chat API errors
#[derive(Debug)]
pub enum ChatError {
    BadRequest,
    CompletionFailed,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::CompletionFailed => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                error: CHAT_APOLOGY.to_string(),
            }),
        )
            .into_response()
    }
}
