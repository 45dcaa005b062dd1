//! Companion Gateway - Voice-enabled wellness chat gateway
//!
//! This library provides the core functionality for the companion gateway:
//! - Per-visitor conversation sessions keyed by a cookie token
//! - Chat completion with immediate retry on connection resets
//! - Speech synthesis with a per-language voice table
//! - A chat client with capture/playback interruption handling
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Chat Client                       │
//! │   Transcript  │  Capture  │  Playback  │  Language  │
//! └────────────────────┬────────────────────────────────┘
//!                      │  /api/chat  /api/tts
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Companion Gateway                    │
//! │   Sessions  │  Orchestrator  │  Pages  │  Health    │
//! └──────────┬─────────────────────────────┬────────────┘
//!            │                             │
//! ┌──────────▼──────────┐       ┌──────────▼──────────┐
//! │   Chat Completions  │       │   Text-to-Speech    │
//! └─────────────────────┘       └─────────────────────┘
//! ```

pub mod api;
pub mod client;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod error;
pub mod orchestrator;
pub mod persona;
pub mod session;
pub mod text;
pub mod voice;

pub use api::{ApiServer, ApiServerBuilder};
pub use client::{ChatApi, ChatClient};
pub use completion::{CompletionGateway, OpenAiCompletion, RetryPolicy};
pub use config::Config;
pub use conversation::{ConversationTurn, Role, Session};
pub use error::{Error, Result};
pub use orchestrator::{SessionOrchestrator, UserMessage};
pub use persona::Persona;
pub use session::{MemorySessionStore, SessionStore};
pub use voice::{GoogleTts, SpeechSynthesizer, VoiceProfile};
