//! Application composition root.
//!
//! Every collaborator is injected here and nowhere else; there are no
//! globals. Tests build a context from in-memory doubles, production
//! code uses [`AppContext::with_local_store`].

use std::sync::Arc;

use openconv_core::backend::ChatBackend;
use openconv_core::error::Result;
use openconv_core::session_repository::SessionRepository;
use openconv_core::verifier::CredentialVerifier;
use openconv_infrastructure::{InMemorySessionRepository, LocalSettingsStore, SettingsStore};
use openconv_interaction::{HttpChatBackend, HttpCredentialVerifier};

use crate::agent::{AgentFactory, AgentSessionCache};
use crate::chat_service::ChatService;
use crate::config_controller::ConfigController;

/// Shared handles to the wired-up runtime.
pub struct AppContext {
    /// Configuration state machine
    pub config: Arc<ConfigController>,
    /// Per-session agent cache, shared with the controller
    pub cache: Arc<AgentSessionCache>,
    /// Chat orchestration over sessions and agents
    pub chat: Arc<ChatService>,
    /// Session and transcript storage
    pub sessions: Arc<dyn SessionRepository>,
}

impl AppContext {
    /// Wires a context from explicit collaborators.
    ///
    /// # Arguments
    ///
    /// * `verifier` - Credential verification against provider APIs
    /// * `backend` - Model completion transport
    /// * `sessions` - Session and transcript storage
    /// * `store` - Settings persistence (primary bridge plus local fallback)
    pub fn new(
        verifier: Arc<dyn CredentialVerifier>,
        backend: Arc<dyn ChatBackend>,
        sessions: Arc<dyn SessionRepository>,
        store: SettingsStore,
    ) -> Self {
        let cache = Arc::new(AgentSessionCache::new(AgentFactory::new(backend)));
        let config = Arc::new(ConfigController::new(verifier, store, Arc::clone(&cache)));
        let chat = Arc::new(ChatService::new(
            Arc::clone(&config),
            Arc::clone(&cache),
            Arc::clone(&sessions),
        ));

        Self {
            config,
            cache,
            chat,
            sessions,
        }
    }

    /// Production wiring: HTTP verifier and backend, in-memory sessions,
    /// settings persisted to the local config directory.
    pub fn with_local_store() -> Result<Self> {
        let store = SettingsStore::new(LocalSettingsStore::new()?);
        Ok(Self::new(
            Arc::new(HttpCredentialVerifier::new()),
            Arc::new(HttpChatBackend::new()),
            Arc::new(InMemorySessionRepository::new()),
            store,
        ))
    }
}
