//! Configuration management for the companion gateway
//!
//! Sources, highest priority first: environment (including `.env`), the
//! TOML config file, built-in defaults. CLI flags override the result in
//! `main`.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::completion::{self, RetryPolicy};
use crate::session::{DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL};
use crate::voice;
use crate::{Error, Persona, Result};

pub use file::CompanionConfigFile;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Companion gateway configuration
#[derive(Debug)]
pub struct Config {
    /// Assistant persona
    pub persona: Persona,

    /// API keys
    pub api_keys: ApiKeys,

    /// Completion API configuration
    pub llm: LlmConfig,

    /// TTS API base URL
    pub tts_base_url: String,

    /// HTTP server configuration
    pub server: ServerConfig,
}

/// Credentials for the two upstream services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (chat completions)
    pub openai: Option<SecretString>,

    /// Google Cloud Text-to-Speech API key
    pub google_tts: Option<SecretString>,
}

/// Completion API configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub retry: RetryPolicy,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Directory with the landing and application pages
    pub static_dir: PathBuf,

    /// Idle lifetime of a session
    pub session_ttl: Duration,

    /// Maximum number of live sessions
    pub max_sessions: u64,
}

impl Config {
    /// Load configuration from the environment and the config file
    ///
    /// # Errors
    ///
    /// Returns error if a numeric environment value cannot be parsed
    pub fn load() -> Result<Self> {
        Self::from_sources(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a numeric environment value cannot be parsed
    pub fn from_sources(
        fc: CompanionConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            google_tts: env("GOOGLE_TTS_API_KEY")
                .or(fc.api_keys.google_tts)
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
        };

        let retry_backoff_ms = parse_env(&env, "COMPANION_RETRY_BACKOFF_MS")?
            .or(fc.llm.retry_backoff_ms)
            .unwrap_or(0);

        let llm = LlmConfig {
            base_url: env("COMPANION_LLM_BASE_URL")
                .or(fc.llm.base_url)
                .unwrap_or_else(|| completion::DEFAULT_BASE_URL.to_string()),
            model: env("COMPANION_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| completion::DEFAULT_MODEL.to_string()),
            retry: RetryPolicy {
                base_delay: Duration::from_millis(retry_backoff_ms),
                ..RetryPolicy::default()
            },
        };

        let tts_base_url = env("COMPANION_TTS_BASE_URL")
            .or(fc.tts.base_url)
            .unwrap_or_else(|| voice::DEFAULT_TTS_BASE_URL.to_string());

        let server = ServerConfig {
            port: parse_env(&env, "PORT")?
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            static_dir: env("COMPANION_STATIC_DIR")
                .or(fc.server.static_dir)
                .map_or_else(|| PathBuf::from("frontend"), PathBuf::from),
            session_ttl: parse_env(&env, "COMPANION_SESSION_TTL_SECS")?
                .or(fc.server.session_ttl_secs)
                .map_or(DEFAULT_SESSION_TTL, Duration::from_secs),
            max_sessions: parse_env(&env, "COMPANION_MAX_SESSIONS")?
                .or(fc.server.max_sessions)
                .unwrap_or(DEFAULT_MAX_SESSIONS),
        };

        Ok(Self {
            persona: fc.persona.unwrap_or_default(),
            api_keys,
            llm,
            tts_base_url,
            server,
        })
    }

    /// Take both upstream credentials, failing if either is missing
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming every missing key
    pub fn require_keys(&mut self) -> Result<(SecretString, SecretString)> {
        match (self.api_keys.openai.take(), self.api_keys.google_tts.take()) {
            (Some(openai), Some(tts)) => Ok((openai, tts)),
            (openai, tts) => {
                let mut missing = Vec::new();
                if openai.is_none() {
                    missing.push("OPENAI_API_KEY");
                }
                if tts.is_none() {
                    missing.push("GOOGLE_TTS_API_KEY");
                }
                self.api_keys = ApiKeys {
                    openai,
                    google_tts: tts,
                };
                Err(Error::Config(format!(
                    "missing required credentials: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

/// Parse an optional numeric environment value
fn parse_env<T: std::str::FromStr>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    env(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| Error::Config(format!("invalid value for {key}: {raw}")))
        })
        .transpose()
}
