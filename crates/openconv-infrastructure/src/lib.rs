//! Storage backends for OpenConverse.
//!
//! Implements the persistence side of the runtime: path resolution, the
//! local settings file, the dual-backend settings store, and an
//! in-memory session repository.

pub mod local_store;
pub mod memory_session_repository;
pub mod paths;
pub mod settings_store;

pub use local_store::LocalSettingsStore;
pub use memory_session_repository::InMemorySessionRepository;
pub use paths::ConvPaths;
pub use settings_store::SettingsStore;
