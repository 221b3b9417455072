//! Application layer for the OpenConverse runtime.
//!
//! Hosts the configuration state machine, the per-session agent cache,
//! and the chat orchestration that ties sessions to the configured
//! provider. The composition root in [`context`] wires these against
//! the infrastructure and interaction crates.

pub mod agent;
pub mod chat_service;
pub mod config_controller;
pub mod context;

pub use agent::{AgentConfig, AgentFactory, AgentHandle, AgentSessionCache, AgentType};
pub use chat_service::ChatService;
pub use config_controller::{ConfigController, NoticeKind, SaveNotice};
pub use context::AppContext;
