//! Agent construction and per-session caching.

pub mod cache;
pub mod factory;

pub use cache::{AgentSessionCache, ConfigFingerprint};
pub use factory::{AgentConfig, AgentFactory, AgentHandle, AgentType};
