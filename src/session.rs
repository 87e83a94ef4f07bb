//! Per-run session state.
//!
//! The session id is generated once at startup and never leaves the
//! process; there is no server-side session recovery. Only the selected
//! agent changes over the session's lifetime.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Agent selected when none is configured.
pub const DEFAULT_AGENT_ID: &str = "tutor";

/// Opaque session identity plus the active tutor agent.
#[derive(Debug, Clone)]
pub struct SessionContext {
    session_id: String,
    selected_agent_id: String,
}

impl SessionContext {
    /// Create a fresh session with a random UUID v4 identity.
    pub fn new(agent_id: impl Into<String>) -> Self {
        SessionContext {
            session_id: Uuid::new_v4().to_string(),
            selected_agent_id: agent_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn selected_agent_id(&self) -> &str {
        &self.selected_agent_id
    }

    /// Switch the active agent. The session id is untouched: the backend
    /// keys progress by (session, agent).
    pub fn select_agent(&mut self, agent_id: impl Into<String>) {
        self.selected_agent_id = agent_id.into();
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        SessionContext::new(DEFAULT_AGENT_ID)
    }
}

/// What to do when a submit arrives while a chat request is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubmitPolicy {
    /// Reject the second submit with a status notice; no transcript
    /// mutation, no network call.
    #[default]
    Block,
    /// Allow interleaved sends; replies land in arrival order.
    LastReplyWins,
}

impl std::fmt::Display for SubmitPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitPolicy::Block => write!(f, "block"),
            SubmitPolicy::LastReplyWins => write!(f, "last-reply-wins"),
        }
    }
}
