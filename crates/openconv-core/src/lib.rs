//! Core domain types and collaborator traits for OpenConverse.
//!
//! This crate holds the pieces every other layer agrees on: the error
//! taxonomy, the provider catalog and configured-provider state, the
//! persisted settings model, session/transcript types, and the traits
//! (`SettingsBridge`, `CredentialVerifier`, `ChatBackend`,
//! `SessionRepository`) that infrastructure and interaction implement.

pub mod backend;
pub mod bridge;
pub mod error;
pub mod provider;
pub mod session;
pub mod session_repository;
pub mod settings;
pub mod verifier;

pub use error::{ConvError, Result};
