//! Text-to-speech (TTS) processing

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::profile::{VoiceGender, VoiceProfile};
use crate::text::strip_emoticons;
use crate::{Error, Result};

/// Default Google Cloud TTS base URL
pub const DEFAULT_BASE_URL: &str = "https://texttospeech.googleapis.com";

/// Audio encoding requested from the TTS API
pub const AUDIO_ENCODING: &str = "MP3";

/// Playback speed sent with every request
pub const SPEAKING_RATE: f32 = 1.0;

/// Pitch offset in semitones sent with every request
pub const PITCH: f32 = 0.5;

/// Turns text into base64-encoded audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` in the voice for `language_code`
    ///
    /// # Errors
    ///
    /// Returns error if the upstream call fails
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<String>;
}

/// Synthesizes speech with Google Cloud Text-to-Speech
#[derive(Debug, Clone)]
pub struct GoogleTts {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
    ssml_gender: VoiceGender,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f32,
    pitch: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: Option<String>,
}

impl GoogleTts {
    /// Create a new Google TTS client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: SecretString) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "Google TTS API key required for speech synthesis".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the upstream base URL (no trailing slash)
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn request(&self, text: &str, language_code: &str) -> Result<String> {
        let cleaned = strip_emoticons(text);
        let profile = VoiceProfile::for_language(language_code);
        if !VoiceProfile::is_supported(language_code) {
            tracing::debug!(
                language = language_code,
                voice = profile.voice_name,
                "no voice for language, using default"
            );
        }

        tracing::debug!(
            language = language_code,
            voice = profile.voice_name,
            chars = cleaned.len(),
            "synthesizing speech"
        );

        let request = SynthesizeRequest {
            input: SynthesisInput { text: &cleaned },
            voice: VoiceSelection {
                language_code,
                name: profile.voice_name,
                ssml_gender: profile.gender,
            },
            audio_config: AudioConfig {
                audio_encoding: AUDIO_ENCODING,
                speaking_rate: SPEAKING_RATE,
                pitch: PITCH,
            },
        };

        let response = self
            .client
            .post(format!("{}/v1/text:synthesize", self.base_url))
            .query(&[("key", self.api_key.expose_secret())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamRejected { status, body });
        }

        let body: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| Error::MalformedResponse(e.to_string()))?;

        body.audio_content
            .ok_or_else(|| Error::MalformedResponse("missing audioContent".to_string()))
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, language_code: &str) -> Result<String> {
        self.request(text, language_code)
            .await
            .map_err(|e| Error::Tts(Box::new(e)))
    }
}
