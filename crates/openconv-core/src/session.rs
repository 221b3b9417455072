//! Conversation sessions and their transcript messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the role of a message in a conversation.
///
/// Serialized lowercase because the wire format of OpenAI-compatible
/// backends expects `"user"` / `"assistant"` / `"system"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System-level instruction.
    System,
    /// Message from the user.
    User,
    /// Message from the AI assistant.
    Assistant,
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Active,
    Archived,
}

/// A conversation the user can return to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    /// Role the agent plays in this session, e.g. "research assistant".
    #[serde(default)]
    pub role: Option<String>,
    /// Free-form goals shown to the agent as part of its instructions.
    #[serde(default)]
    pub goals: Option<String>,
    /// Provider this session was started against, if pinned.
    #[serde(default)]
    pub provider_id: Option<String>,
    /// Model override for this session; `None` falls back to the
    /// provider's configured model.
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

/// Fields the caller supplies when creating a session.
///
/// The repository assigns the id, status, and timestamp.
#[derive(Debug, Clone, Default)]
pub struct NewSession {
    pub name: String,
    pub role: Option<String>,
    pub goals: Option<String>,
    pub provider_id: Option<String>,
    pub model_id: Option<String>,
}

impl Session {
    /// Materializes a draft into a session with a fresh id.
    pub fn create(draft: NewSession) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            role: draft.role,
            goals: draft.goals,
            provider_id: draft.provider_id,
            model_id: draft.model_id,
            status: SessionStatus::Active,
            created_at: Utc::now(),
        }
    }

    /// Extra system instructions derived from the session's role and
    /// goals, when either is set. Not part of the stored transcript.
    pub fn instructions(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(role) = &self.role {
            parts.push(format!("In this conversation you act as {role}."));
        }
        if let Some(goals) = &self.goals {
            parts.push(format!("The user's goals: {goals}"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// A single message in a session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub session_id: String,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(
        session_id: impl Into<String>,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}
