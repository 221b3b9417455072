//! Agent construction.
//!
//! The factory is the single validation gate between configuration and
//! a usable agent: every creation path goes through [`AgentFactory::create`],
//! so no caller can end up holding an agent bound to a disabled provider
//! or an unverified credential.

use std::sync::Arc;

use openconv_core::backend::{ChatBackend, ModelConfig, PromptMessage};
use openconv_core::error::{ConvError, Result};
use openconv_core::provider::ConfiguredProvider;
use openconv_core::session::{ChatMessage, MessageRole};
use serde::{Deserialize, Serialize};

/// Agent archetype, selecting the base system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    /// Plain conversational agent with no special framing.
    General,
    /// Task-focused personal assistant.
    Assistant,
    /// Data analysis specialist.
    Analyst,
}

impl AgentType {
    pub fn system_prompt(&self) -> &'static str {
        match self {
            AgentType::General => {
                "You are a helpful AI assistant. Answer clearly and concisely, \
                 and say so when you are unsure rather than guessing."
            }
            AgentType::Assistant => {
                "You are a personal assistant. Help the user plan, organize, and \
                 follow through on their tasks. Prefer concrete next steps over \
                 general advice, and keep track of details the user has already \
                 provided in this conversation."
            }
            AgentType::Analyst => {
                "You are a data analysis specialist. Work through problems \
                 step by step, state your assumptions explicitly, and present \
                 conclusions with the evidence that supports them. When the \
                 data is insufficient, say what additional data would help."
            }
        }
    }
}

/// The configuration fields agent construction consumes.
///
/// Built from the live provider at call time, with the session's model
/// override already applied. No `Debug` derive: it carries the raw
/// credential.
#[derive(Clone, PartialEq)]
pub struct AgentConfig {
    pub provider_id: String,
    pub credential: String,
    pub base_url: String,
    pub model: String,
    pub enabled: bool,
    pub requires_auth: bool,
    pub verified: bool,
}

impl AgentConfig {
    /// Effective configuration for a session.
    pub fn for_session(provider: &ConfiguredProvider, model_override: Option<&str>) -> Self {
        Self {
            provider_id: provider.id.clone(),
            credential: provider.credential.clone(),
            base_url: provider.base_url.clone(),
            model: model_override.unwrap_or(&provider.model).to_string(),
            enabled: provider.enabled,
            requires_auth: provider.requires_auth,
            verified: provider.verified,
        }
    }
}

/// Builds agent handles from validated configuration.
pub struct AgentFactory {
    backend: Arc<dyn ChatBackend>,
}

impl AgentFactory {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// Validates the configuration and constructs a handle.
    ///
    /// Construction itself is synchronous and pure; only the returned
    /// handle's `send_message` reaches the network.
    pub fn create(&self, agent_type: AgentType, config: &AgentConfig) -> Result<AgentHandle> {
        if !config.enabled {
            return Err(ConvError::configuration(format!(
                "Provider '{}' is disabled",
                config.provider_id
            )));
        }

        if config.requires_auth {
            if config.credential.is_empty() {
                return Err(ConvError::configuration(format!(
                    "Provider '{}' requires a credential",
                    config.provider_id
                )));
            }
            if !config.verified {
                return Err(ConvError::configuration(format!(
                    "Credential for provider '{}' has not been verified",
                    config.provider_id
                )));
            }
        }

        Ok(AgentHandle {
            agent_type,
            model: ModelConfig {
                base_url: config.base_url.clone(),
                api_key: config.credential.clone(),
                model: config.model.clone(),
            },
            backend: Arc::clone(&self.backend),
        })
    }
}

/// A configured agent bound to one provider and model.
#[derive(Clone)]
pub struct AgentHandle {
    agent_type: AgentType,
    model: ModelConfig,
    backend: Arc<dyn ChatBackend>,
}

/// Manual impl: `model` carries the raw credential and is omitted.
impl std::fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentHandle")
            .field("agent_type", &self.agent_type)
            .finish_non_exhaustive()
    }
}

impl AgentHandle {
    pub fn agent_type(&self) -> AgentType {
        self.agent_type
    }

    /// Sends one user message with conversation context and returns the
    /// assistant's reply.
    ///
    /// Backend failures propagate untouched; retry policy belongs to
    /// the caller.
    pub async fn send_message(&self, text: &str, context: &[ChatMessage]) -> Result<String> {
        let mut messages = Vec::with_capacity(context.len() + 2);
        messages.push(PromptMessage::new(
            MessageRole::System,
            self.agent_type.system_prompt(),
        ));
        for entry in context {
            messages.push(PromptMessage::new(entry.role, entry.content.clone()));
        }
        messages.push(PromptMessage::new(MessageRole::User, text));

        self.backend.send_completion(&messages, &self.model).await
    }
}
