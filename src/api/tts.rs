//! Text-to-speech endpoint

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};

use super::{ApiState, ErrorResponse};
use crate::voice::DEFAULT_LANGUAGE;

/// User-facing message for any synthesis failure
pub const TTS_APOLOGY: &str =
    "Sorry, I encountered an error in generating speech. Please try again later.";

/// Build TTS router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/tts", post(synthesize)).with_state(state)
}

/// Synthesis request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsRequest {
    pub message: String,
    #[serde(default = "default_language")]
    pub language_code: String,
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

/// Synthesis response carrying base64 MP3 audio
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsResponse {
    pub audio_content: String,
}

/// Synthesize text to speech
async fn synthesize(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Json<TtsResponse>, TtsError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "invalid TTS request body");
        TtsError
    })?;

    let audio_content = state
        .tts
        .synthesize(&request.message, &request.language_code)
        .await
        .map_err(|e| {
            tracing::error!(language = %request.language_code, error = %e, "error in TTS API");
            TtsError
        })?;

    Ok(Json(TtsResponse { audio_content }))
}

/// Synthesis failed upstream
#[derive(Debug)]
pub struct TtsError;

impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: TTS_APOLOGY.to_string(),
            }),
        )
            .into_response()
    }
}
