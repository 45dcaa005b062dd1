//! Session store
//!
//! Maps opaque session tokens to conversation state. Sessions expire after a
//! period of inactivity; an expired token simply resolves to a new session.

use std::sync::Arc;
use std::time::Duration;

use mini_moka::sync::Cache;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::conversation::Session;

/// Handle to one session, locked for the duration of an exchange
pub type SharedSession = Arc<Mutex<Session>>;

/// Default idle lifetime of a session
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// Default maximum number of live sessions
pub const DEFAULT_MAX_SESSIONS: u64 = 10_000;

/// Outcome of resolving a session token
pub struct ResolvedSession {
    pub id: String,
    pub session: SharedSession,
    /// True when no live session matched and a new one was issued
    pub created: bool,
}

/// Mapping from session token to session state
pub trait SessionStore: Send + Sync {
    /// Look up a live session
    fn get(&self, id: &str) -> Option<SharedSession>;

    /// Issue a new empty session
    fn create(&self) -> (String, SharedSession);

    /// Resolve a token, creating a session when it is absent or expired
    fn resolve(&self, id: Option<&str>) -> ResolvedSession {
        if let Some(id) = id {
            if let Some(session) = self.get(id) {
                return ResolvedSession {
                    id: id.to_string(),
                    session,
                    created: false,
                };
            }
            tracing::debug!(session_id = id, "session token unknown or expired");
        }

        let (id, session) = self.create();
        tracing::debug!(session_id = %id, "created session");
        ResolvedSession {
            id,
            session,
            created: true,
        }
    }
}

/// In-memory session store with idle expiry
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Cache<String, SharedSession>,
}

impl MemorySessionStore {
    /// Create a store whose sessions expire after `ttl` without access
    #[must_use]
    pub fn new(ttl: Duration, max_sessions: u64) -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(max_sessions)
                .time_to_idle(ttl)
                .build(),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions.get(&id.to_string())
    }

    fn create(&self) -> (String, SharedSession) {
        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(Session::new(id.clone())));
        self.sessions.insert(id.clone(), Arc::clone(&session));
        (id, session)
    }
}
