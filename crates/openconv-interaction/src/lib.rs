//! HTTP provider integrations for OpenConverse.
//!
//! Concrete implementations of the core's `CredentialVerifier` and
//! `ChatBackend` traits against real provider APIs.

pub mod chat_backend;
pub mod http_verifier;

pub use chat_backend::HttpChatBackend;
pub use http_verifier::HttpCredentialVerifier;
