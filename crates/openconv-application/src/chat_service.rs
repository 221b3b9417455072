//! Session-level chat orchestration.
//!
//! Bridges the session repository, the configuration state, and the
//! per-session agent cache: callers hand over a session id and a user
//! message, the service resolves the agent for that session from the
//! currently configured provider and persists both sides of the
//! exchange.

use std::sync::Arc;

use openconv_core::error::{ConvError, Result};
use openconv_core::session::{ChatMessage, MessageRole, NewSession, Session};
use openconv_core::session_repository::SessionRepository;

use crate::agent::{AgentConfig, AgentSessionCache, AgentType};
use crate::config_controller::ConfigController;

/// How many prior messages are replayed to the model as context.
const CONTEXT_WINDOW: usize = 20;

pub struct ChatService {
    controller: Arc<ConfigController>,
    cache: Arc<AgentSessionCache>,
    sessions: Arc<dyn SessionRepository>,
}

impl ChatService {
    pub fn new(
        controller: Arc<ConfigController>,
        cache: Arc<AgentSessionCache>,
        sessions: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            controller,
            cache,
            sessions,
        }
    }

    pub async fn create_session(&self, draft: NewSession) -> Result<Session> {
        self.sessions.create(draft).await
    }

    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.sessions.list_all().await
    }

    /// Deletes a session and evicts its cached agent.
    ///
    /// Returns whether a session was actually removed.
    pub async fn delete_session(&self, session_id: &str) -> Result<bool> {
        let removed = self.sessions.delete(session_id).await?;
        if removed {
            self.cache.remove(session_id);
        }
        Ok(removed)
    }

    /// Sends a user message in a session and returns the assistant
    /// reply.
    ///
    /// The user message is persisted before the model call, so a failed
    /// call leaves the transcript with the user's side intact; the
    /// error propagates to the caller for retry.
    pub async fn send_message(
        &self,
        session_id: &str,
        agent_type: AgentType,
        text: &str,
    ) -> Result<ChatMessage> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| ConvError::not_found("session", session_id))?;

        let provider = self
            .controller
            .current_provider()
            .ok_or_else(|| ConvError::configuration("No provider selected"))?;
        let config = AgentConfig::for_session(&provider, session.model_id.as_deref());
        let agent = self.cache.get_or_create(session_id, agent_type, &config)?;

        // Context is captured before appending; the new user text goes
        // to the model as the prompt itself.
        let mut context = self
            .sessions
            .recent_messages(session_id, Some(CONTEXT_WINDOW))
            .await?;
        if let Some(instructions) = session.instructions() {
            context.insert(
                0,
                ChatMessage::new(session_id, MessageRole::System, instructions),
            );
        }

        self.sessions
            .append_message(session_id, MessageRole::User, text)
            .await?;

        let reply = agent.send_message(text, &context).await?;

        self.sessions
            .append_message(session_id, MessageRole::Assistant, &reply)
            .await
    }
}
