//! Session orchestrator
//!
//! Owns the turn-appending rules for one exchange. Synthesis is left to the
//! caller; this module only produces assistant text.

use std::sync::Arc;

use chrono::Utc;

use crate::completion::CompletionGateway;
use crate::conversation::Session;
use crate::persona::Persona;
use crate::session::{ResolvedSession, SessionStore};
use crate::text::clean_reply;
use crate::{Error, Result};

/// One user message as received from the client
#[derive(Debug, Clone, Default)]
pub struct UserMessage {
    pub text: String,
    /// Name offered by the user, only honoured once per session
    pub display_name: Option<String>,
    /// The user spoke over assistant playback
    pub is_interruption: bool,
}

impl UserMessage {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn interrupting(mut self, is_interruption: bool) -> Self {
        self.is_interruption = is_interruption;
        self
    }
}

/// Result of [`SessionOrchestrator::handle`]
pub struct Exchange {
    pub session_id: String,
    /// A new session was issued for this exchange
    pub created: bool,
    pub reply: Result<String>,
}

/// Applies conversation rules and calls the completion gateway
#[derive(Clone)]
pub struct SessionOrchestrator {
    store: Arc<dyn SessionStore>,
    completion: Arc<dyn CompletionGateway>,
    persona: Persona,
}

impl SessionOrchestrator {
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        completion: Arc<dyn CompletionGateway>,
        persona: Persona,
    ) -> Self {
        Self {
            store,
            completion,
            persona,
        }
    }

    /// Resolve a session token through the injected store
    #[must_use]
    pub fn resolve(&self, token: Option<&str>) -> ResolvedSession {
        self.store.resolve(token)
    }

    /// Resolve the session for `token` and run one exchange under its lock
    pub async fn handle(&self, token: Option<&str>, message: &UserMessage) -> Exchange {
        let resolved = self.resolve(token);
        let mut session = resolved.session.lock().await;
        let reply = self.handle_message(&mut session, message).await;
        Exchange {
            session_id: resolved.id,
            created: resolved.created,
            reply,
        }
    }

    /// Handle one user message against a session
    ///
    /// A first-time name introduction is answered with the persona greeting
    /// without calling the completion gateway.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Completion`] if the gateway fails. Turns appended
    /// before the call are kept; no assistant turn is added.
    pub async fn handle_message(
        &self,
        session: &mut Session,
        message: &UserMessage,
    ) -> Result<String> {
        let now = Utc::now();
        tracing::debug!(
            session_id = session.id(),
            age_secs = (now - session.created_at()).num_seconds(),
            idle_secs = (now - session.last_active()).num_seconds(),
            "handling message"
        );

        if session.ensure_persona(&self.persona.system_prompt) {
            tracing::debug!(session_id = session.id(), "seeded persona turn");
        }

        if let Some(name) = message.display_name.as_deref().filter(|n| !n.is_empty())
            && session.set_display_name_once(name)
        {
            let greeting = self.persona.greeting(name);
            session.push_user(Persona::introduction(name));
            session.push_assistant(greeting.clone());
            tracing::info!(session_id = session.id(), "greeted new user");
            return Ok(greeting);
        }

        if message.is_interruption {
            session.push_assistant(self.persona.interruption_ack.clone());
        }
        session.push_user(message.text.clone());

        tracing::debug!(
            session_id = session.id(),
            turns = session.turns().len(),
            interruption = message.is_interruption,
            "requesting assistant reply"
        );

        let raw = self
            .completion
            .complete(session.turns())
            .await
            .map_err(|e| {
                tracing::error!(session_id = session.id(), error = %e, "chat completion failed");
                Error::Completion(Box::new(e))
            })?;

        let reply = clean_reply(&raw);
        session.push_assistant(reply.clone());
        Ok(reply)
    }
}
