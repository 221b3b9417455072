//! Model backend abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::MessageRole;

/// One role/content pair in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: MessageRole,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Connection parameters for one completion call.
///
/// No `Debug` derive: the struct carries the raw credential.
#[derive(Clone, PartialEq)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

/// Produces chat completions for a configured provider.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Sends one completion request and returns the assistant's text.
    ///
    /// Failures surface as
    /// [`ConvError::Network`](crate::error::ConvError::Network) and are
    /// not retried at this layer.
    async fn send_completion(
        &self,
        messages: &[PromptMessage],
        model: &ModelConfig,
    ) -> Result<String>;
}
