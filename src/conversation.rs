//! Conversation turns and per-user session state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One message in a conversation, serialized in the chat-completions shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Server-held conversational state for one browsing session
///
/// Turns are append-only. The only way to add a system turn is
/// [`Session::ensure_persona`], which does nothing once history exists,
/// so the persona turn is always first and never duplicated.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    turns: Vec<ConversationTurn>,
    display_name: Option<String>,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl Session {
    /// Create an empty session with the given token
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            turns: Vec::new(),
            display_name: None,
            created_at: now,
            last_active: now,
        }
    }

    /// Opaque session token
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Ordered turn history
    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    /// Seed the history with the persona instruction if it is empty
    ///
    /// Returns `true` when the persona turn was inserted.
    pub fn ensure_persona(&mut self, system_prompt: &str) -> bool {
        if !self.turns.is_empty() {
            return false;
        }
        self.turns
            .push(ConversationTurn::new(Role::System, system_prompt));
        true
    }

    /// Store the display name unless one is already set
    ///
    /// Returns `true` when the name was stored.
    pub fn set_display_name_once(&mut self, name: &str) -> bool {
        if self.display_name.is_some() {
            return false;
        }
        self.display_name = Some(name.to_string());
        true
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Role::User, content.into());
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Role::Assistant, content.into());
    }

    fn push(&mut self, role: Role, content: String) {
        self.turns.push(ConversationTurn { role, content });
        self.last_active = Utc::now();
    }
}
