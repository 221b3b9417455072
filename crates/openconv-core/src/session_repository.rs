//! Session storage collaborator trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::{ChatMessage, MessageRole, NewSession, Session};

/// Narrow interface onto session and transcript storage.
///
/// The runtime reads just enough history to assemble agent context and
/// appends transcript entries; it does not own the storage format.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    async fn list_all(&self) -> Result<Vec<Session>>;

    async fn create(&self, draft: NewSession) -> Result<Session>;

    /// Returns `true` when a session was actually removed.
    async fn delete(&self, session_id: &str) -> Result<bool>;

    async fn append_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ChatMessage>;

    /// Most recent messages in chronological order, capped at `limit`.
    async fn recent_messages(
        &self,
        session_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>>;
}
