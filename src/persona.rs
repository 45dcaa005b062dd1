//! Persona configuration
//!
//! The persona supplies the system instruction that opens every session and
//! the fixed phrases the orchestrator uses without calling the LLM.

use serde::{Deserialize, Serialize};

const DEFAULT_NAME: &str = "Shivani";

const DEFAULT_DEVELOPER: &str = "Sandeep Roy";

const DEFAULT_SYSTEM_PROMPT: &str = "You are Shivani, a highly empathetic and humorous wellness \
assistant. Your goal is to provide detailed, solution-oriented advice. Avoid short or generic \
responses, and only suggest seeing a doctor if absolutely necessary. Use humor to keep the \
conversation light-hearted when appropriate, and always show care and empathy.";

const DEFAULT_INTERRUPTION_ACK: &str = "Oh, okay, go on. I'm all ears!";

/// Identity of the assistant
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", default)]
pub struct Persona {
    /// Display name used in the greeting
    pub name: String,

    /// Credited developer, mentioned in the greeting
    pub developer: String,

    /// System instruction seeded as the first turn of every session
    pub system_prompt: String,

    /// Assistant turn recorded when the user talks over playback
    pub interruption_ack: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            developer: DEFAULT_DEVELOPER.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            interruption_ack: DEFAULT_INTERRUPTION_ACK.to_string(),
        }
    }
}

impl Persona {
    /// Fixed greeting returned when a user first introduces themselves
    #[must_use]
    pub fn greeting(&self, user_name: &str) -> String {
        format!(
            "Hi {user_name}, I am {}, your AI assistant for wellness and health, and I am \
             developed by {}. How can I assist you today? \u{1F604}",
            self.name, self.developer
        )
    }

    /// User turn recorded for a name introduction
    #[must_use]
    pub fn introduction(user_name: &str) -> String {
        format!("My name is {user_name}.")
    }
}
