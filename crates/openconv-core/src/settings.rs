//! Persisted settings model.
//!
//! [`SettingsSnapshot`] is the unit the settings store reads and writes;
//! everything in it must survive a JSON round trip unchanged.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConvError, Result};
use crate::provider::ConfiguredProvider;

/// Which storage backend conversation memory uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Local,
    Remote,
}

/// Conversation-memory configuration, keyed by storage kind.
///
/// The two kinds have disjoint parameter sets, so switching kinds replaces
/// the whole value rather than merging a parameter map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "storage_kind", rename_all = "lowercase")]
pub enum MemoryConfig {
    /// Embedded store on the local disk.
    Local {
        /// Database path override; `None` means the platform default.
        #[serde(default)]
        database: Option<PathBuf>,
    },
    /// Hosted memory service.
    Remote { endpoint: String, api_key: String },
}

impl MemoryConfig {
    /// Default parameters for a storage kind.
    pub fn default_for(kind: MemoryKind) -> Self {
        match kind {
            MemoryKind::Local => Self::Local { database: None },
            MemoryKind::Remote => Self::Remote {
                endpoint: String::new(),
                api_key: String::new(),
            },
        }
    }

    pub fn kind(&self) -> MemoryKind {
        match self {
            Self::Local { .. } => MemoryKind::Local,
            Self::Remote { .. } => MemoryKind::Remote,
        }
    }

    /// Sets one parameter on the current kind.
    ///
    /// Keys from the other kind are rejected instead of being stored
    /// silently; switching kinds goes through [`MemoryConfig::default_for`].
    pub fn set_param(&mut self, key: &str, value: &str) -> Result<()> {
        match self {
            Self::Local { database } => match key {
                "database" => {
                    *database = if value.is_empty() {
                        None
                    } else {
                        Some(PathBuf::from(value))
                    };
                    Ok(())
                }
                _ => Err(ConvError::configuration(format!(
                    "unknown parameter '{key}' for local memory"
                ))),
            },
            Self::Remote { endpoint, api_key } => match key {
                "endpoint" => {
                    *endpoint = value.to_string();
                    Ok(())
                }
                "api_key" => {
                    *api_key = value.to_string();
                    Ok(())
                }
                _ => Err(ConvError::configuration(format!(
                    "unknown parameter '{key}' for remote memory"
                ))),
            },
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self::default_for(MemoryKind::Local)
    }
}

/// Everything the settings store persists.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SettingsSnapshot {
    /// The selected provider, if the user has picked one
    #[serde(default)]
    pub provider: Option<ConfiguredProvider>,
    #[serde(default)]
    pub memory: MemoryConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_param_rejects_key_from_other_kind() {
        let mut config = MemoryConfig::default_for(MemoryKind::Local);
        let err = config.set_param("endpoint", "https://memory.example").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_set_param_updates_remote_fields() {
        let mut config = MemoryConfig::default_for(MemoryKind::Remote);
        config.set_param("endpoint", "https://memory.example").unwrap();
        config.set_param("api_key", "mem-key").unwrap();

        assert_eq!(
            config,
            MemoryConfig::Remote {
                endpoint: "https://memory.example".to_string(),
                api_key: "mem-key".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_database_param_clears_override() {
        let mut config = MemoryConfig::Local {
            database: Some(PathBuf::from("/tmp/mem.db")),
        };
        config.set_param("database", "").unwrap();
        assert_eq!(config, MemoryConfig::Local { database: None });
    }

    #[test]
    fn test_memory_config_json_shape_is_tagged() {
        let config = MemoryConfig::default_for(MemoryKind::Local);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["storage_kind"], "local");
    }

    #[test]
    fn test_snapshot_default_has_no_provider() {
        let snapshot = SettingsSnapshot::default();
        assert!(snapshot.provider.is_none());
        assert_eq!(snapshot.memory.kind(), MemoryKind::Local);
    }
}
