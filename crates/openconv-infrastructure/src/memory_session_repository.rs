//! In-memory session repository.
//!
//! Backing store for tests and for shells that keep transcripts in the
//! host layer. Sessions and their messages live in one map under an
//! async RwLock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use openconv_core::error::{ConvError, Result};
use openconv_core::session::{ChatMessage, MessageRole, NewSession, Session};
use openconv_core::session_repository::SessionRepository;
use tokio::sync::RwLock;

/// Session storage held entirely in memory.
#[derive(Clone, Default)]
pub struct InMemorySessionRepository {
    entries: Arc<RwLock<HashMap<String, (Session, Vec<ChatMessage>)>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        let entries = self.entries.read().await;
        Ok(entries.get(session_id).map(|(session, _)| session.clone()))
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        let entries = self.entries.read().await;
        let mut sessions: Vec<Session> = entries.values().map(|(s, _)| s.clone()).collect();
        // Newest first, matching the session list in the UI
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn create(&self, draft: NewSession) -> Result<Session> {
        let session = Session::create(draft);
        let mut entries = self.entries.write().await;
        entries.insert(session.id.clone(), (session.clone(), Vec::new()));
        Ok(session)
    }

    async fn delete(&self, session_id: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(session_id).is_some())
    }

    async fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatMessage> {
        let mut entries = self.entries.write().await;
        let (_, messages) = entries
            .get_mut(session_id)
            .ok_or_else(|| ConvError::not_found("session", session_id))?;

        let message = ChatMessage::new(session_id, role, content);
        messages.push(message.clone());
        Ok(message)
    }

    async fn recent_messages(
        &self,
        session_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>> {
        let entries = self.entries.read().await;
        let (_, messages) = entries
            .get(session_id)
            .ok_or_else(|| ConvError::not_found("session", session_id))?;

        let messages = match limit {
            Some(limit) if messages.len() > limit => messages[messages.len() - limit..].to_vec(),
            _ => messages.clone(),
        };
        Ok(messages)
    }
}
