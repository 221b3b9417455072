//! Session-keyed agent cache.
//!
//! Caches constructed agents per conversation to avoid rebuilding them
//! on every message. Reuse is a construction-cost optimization only;
//! correctness comes from the fingerprint check on every lookup.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use openconv_core::error::Result;

use super::factory::{AgentConfig, AgentFactory, AgentHandle, AgentType};

/// The configuration fields an agent was built from.
///
/// Compared against the live configuration on every lookup; any drift
/// forces reconstruction so no agent keeps using a replaced credential.
#[derive(Clone, PartialEq)]
pub struct ConfigFingerprint {
    provider_id: String,
    credential: String,
    base_url: String,
    model: String,
    enabled: bool,
}

impl ConfigFingerprint {
    pub fn of(config: &AgentConfig) -> Self {
        Self {
            provider_id: config.provider_id.clone(),
            credential: config.credential.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            enabled: config.enabled,
        }
    }
}

struct CacheEntry {
    agent_type: AgentType,
    fingerprint: ConfigFingerprint,
    handle: Arc<AgentHandle>,
}

/// In-memory cache of constructed agents, keyed by session id.
///
/// Invalidation runs synchronously inside the configuration transition
/// that changes provider state, so a lookup never observes an entry
/// built from configuration that is already gone.
pub struct AgentSessionCache {
    factory: AgentFactory,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl AgentSessionCache {
    pub fn new(factory: AgentFactory) -> Self {
        Self {
            factory,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached agent for the session, or builds one.
    ///
    /// A hit requires both the agent type and the fingerprint to match;
    /// anything else replaces the entry.
    pub fn get_or_create(
        &self,
        session_id: &str,
        agent_type: AgentType,
        config: &AgentConfig,
    ) -> Result<Arc<AgentHandle>> {
        let fingerprint = ConfigFingerprint::of(config);

        {
            let entries = self.entries.read().unwrap();
            if let Some(entry) = entries.get(session_id) {
                if entry.agent_type == agent_type && entry.fingerprint == fingerprint {
                    return Ok(Arc::clone(&entry.handle));
                }
            }
        }

        let handle = Arc::new(self.factory.create(agent_type, config)?);
        let mut entries = self.entries.write().unwrap();
        entries.insert(
            session_id.to_string(),
            CacheEntry {
                agent_type,
                fingerprint,
                handle: Arc::clone(&handle),
            },
        );
        Ok(handle)
    }

    /// Drops every cached agent.
    pub fn invalidate_all(&self) {
        let mut entries = self.entries.write().unwrap();
        if !entries.is_empty() {
            tracing::debug!("Invalidating {} cached agents", entries.len());
        }
        entries.clear();
    }

    /// Evicts one session's agent, e.g. when the conversation is deleted.
    pub fn remove(&self, session_id: &str) {
        self.entries.write().unwrap().remove(session_id);
    }
}
