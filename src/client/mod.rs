//! Chat client
//!
//! Drives one exchange at a time: render the user message, ask the gateway
//! for a reply, render it, then fetch and play the reply audio. Upstream
//! failures become a single apology bubble and never end the session.

mod api;
mod sink;
mod speaker;
mod state;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

pub use api::{ChatApi, ChatBackend, ChatPayload};
pub use sink::{AudioSink, FileSink};
pub use speaker::SpeakerSink;
pub use state::{CaptureCommand, InteractionMachine, InteractionState};

use crate::persona::Persona;
use crate::text::strip_emphasis;
use crate::voice::DEFAULT_LANGUAGE;

/// Shown when the chat request fails
pub const CHAT_FAILED: &str = "Sorry, I encountered an error. Please try again.";

/// Shown when reply audio cannot be fetched or played
pub const AUDIO_FAILED: &str = "Sorry, I couldn't play the audio. Please try again.";

/// Shown when speech capture reports an error
pub const CAPTURE_FAILED: &str = "Sorry, I couldn't understand that. Please try again.";

/// Who a transcript bubble belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

/// One rendered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub speaker: Speaker,
    pub text: String,
}

/// Event reported by the speech capture collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Final transcript for the utterance
    Transcript(String),
    /// Recognition failed
    Error(String),
    /// The speaker stopped talking
    SpeechEnd,
}

/// How an exchange ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// Nothing to send
    Skipped,
    /// Reply rendered and audio playing
    Spoken(String),
    /// Reply rendered, audio failed
    TextOnly(String),
    /// Chat request failed
    Failed,
}

/// Voice chat client over a [`ChatBackend`] and an [`AudioSink`]
pub struct ChatClient<B, S> {
    backend: B,
    sink: S,
    machine: InteractionMachine,
    transcript: Vec<Bubble>,
    language: String,
}

impl<B: ChatBackend, S: AudioSink> ChatClient<B, S> {
    #[must_use]
    pub fn new(backend: B, sink: S) -> Self {
        Self {
            backend,
            sink,
            machine: InteractionMachine::new(),
            transcript: Vec::new(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    /// Rendered conversation so far
    #[must_use]
    pub fn transcript(&self) -> &[Bubble] {
        &self.transcript
    }

    #[must_use]
    pub const fn state(&self) -> InteractionState {
        self.machine.state()
    }

    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Select the language used for capture and synthesis
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Mic button pressed
    ///
    /// Starting capture over playback stops the audio at once.
    pub fn toggle_capture(&mut self) -> CaptureCommand {
        let command = self.machine.toggle_capture();
        if let CaptureCommand::Start {
            interrupted_playback: true,
        } = command
        {
            self.stop_playback();
        }
        command
    }

    /// User typed into the input while capture was active
    pub fn typing_started(&mut self) -> Option<CaptureCommand> {
        if self.machine.is_listening() {
            self.machine.capture_ended();
            return Some(CaptureCommand::Stop);
        }
        None
    }

    /// Handle an event from the speech capture collaborator
    pub async fn on_capture(&mut self, event: CaptureEvent) -> ExchangeOutcome {
        self.machine.capture_ended();
        match event {
            CaptureEvent::Transcript(text) => self.submit(&text).await,
            CaptureEvent::Error(reason) => {
                tracing::warn!(%reason, "speech capture error");
                self.render(Speaker::Assistant, CAPTURE_FAILED);
                ExchangeOutcome::Skipped
            }
            CaptureEvent::SpeechEnd => ExchangeOutcome::Skipped,
        }
    }

    /// Cut playback and return to idle
    pub fn playback_finished(&mut self) {
        self.sink.stop();
        self.machine.playback_stopped();
    }

    /// Return to idle once the sink has played the clip to the end
    ///
    /// Returns `true` if playback ended since the last check.
    pub fn refresh_playback(&mut self) -> bool {
        if self.machine.state() == InteractionState::Speaking && !self.sink.is_playing() {
            self.machine.playback_stopped();
            return true;
        }
        false
    }

    /// Introduce the user by name
    pub async fn introduce(&mut self, name: &str) -> ExchangeOutcome {
        let name = name.trim();
        if name.is_empty() {
            return ExchangeOutcome::Skipped;
        }
        let text = Persona::introduction(name);
        self.exchange(&text, Some(name.to_string())).await
    }

    /// Send a typed or transcribed message
    pub async fn submit(&mut self, text: &str) -> ExchangeOutcome {
        let text = text.trim();
        if text.is_empty() {
            return ExchangeOutcome::Skipped;
        }
        self.exchange(text, None).await
    }

    async fn exchange(&mut self, text: &str, username: Option<String>) -> ExchangeOutcome {
        self.stop_playback();
        self.render(Speaker::User, text);

        let payload = ChatPayload {
            message: text.to_string(),
            username,
            language: self.language.clone(),
            is_interruption: self.machine.take_interruption(),
        };

        let reply = match self.backend.chat(&payload).await {
            Ok(reply) => strip_emphasis(&reply),
            Err(e) => {
                tracing::error!(error = %e, "chat error");
                self.render(Speaker::Assistant, CHAT_FAILED);
                return ExchangeOutcome::Failed;
            }
        };
        self.render(Speaker::Assistant, &reply);

        match self.speak(&reply).await {
            Ok(()) => ExchangeOutcome::Spoken(reply),
            Err(e) => {
                tracing::error!(error = %e, "error playing audio");
                self.render(Speaker::Assistant, AUDIO_FAILED);
                ExchangeOutcome::TextOnly(reply)
            }
        }
    }

    async fn speak(&mut self, text: &str) -> crate::Result<()> {
        let encoded = self.backend.synthesize(text, &self.language).await?;
        let audio = STANDARD.decode(encoded.as_bytes())?;
        self.stop_playback();
        self.sink.play(audio)?;
        self.machine.playback_started();
        Ok(())
    }

    fn stop_playback(&mut self) {
        if self.sink.is_playing() {
            self.sink.stop();
        }
        self.machine.playback_stopped();
    }

    fn render(&mut self, speaker: Speaker, text: &str) {
        self.transcript.push(Bubble {
            speaker,
            text: text.to_string(),
        });
    }
}
