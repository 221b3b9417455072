//! Local settings file storage.
//!
//! The fallback settings backend: a single JSON file under the platform
//! config directory, written atomically so a crash mid-save never leaves
//! a truncated file behind.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use openconv_core::error::{ConvError, Result};
use openconv_core::settings::SettingsSnapshot;
use tokio::task;

use crate::paths::ConvPaths;

/// File-backed settings storage.
///
/// # Features
///
/// - **Atomic writes**: Uses tmp file + fsync + atomic rename pattern
/// - **Restricted permissions**: Settings hold the provider credential,
///   so files are written with mode 600 on Unix
/// - **Async-safe**: All operations wrapped in tokio::task::spawn_blocking
#[derive(Clone)]
pub struct LocalSettingsStore {
    path: PathBuf,
}

impl LocalSettingsStore {
    /// Creates a store at the default platform location.
    pub fn new() -> Result<Self> {
        let path = ConvPaths::settings_file()
            .map_err(|e| ConvError::io(format!("Failed to resolve settings path: {}", e)))?;
        Ok(Self { path })
    }

    /// Creates a store at an explicit path. Used by tests and by hosts
    /// that manage their own config location.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the snapshot from disk.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(SettingsSnapshot))`: Settings loaded successfully
    /// - `Ok(None)`: File does not exist or is empty
    /// - `Err`: Error reading or parsing the file
    pub async fn load(&self) -> Result<Option<SettingsSnapshot>> {
        let path = self.path.clone();

        task::spawn_blocking(move || Self::load_sync(&path))
            .await
            .map_err(|e| ConvError::io(format!("Failed to spawn blocking task: {}", e)))?
    }

    /// Writes the snapshot to disk, replacing any previous one.
    pub async fn save(&self, snapshot: &SettingsSnapshot) -> Result<()> {
        let path = self.path.clone();
        let snapshot = snapshot.clone();

        task::spawn_blocking(move || Self::save_sync(&path, &snapshot))
            .await
            .map_err(|e| ConvError::io(format!("Failed to spawn blocking task: {}", e)))?
    }

    fn load_sync(path: &Path) -> Result<Option<SettingsSnapshot>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ConvError::io(format!(
                "Failed to read settings file '{}': {}",
                path.display(),
                e
            ))
        })?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let snapshot: SettingsSnapshot = serde_json::from_str(&content)?;
        Ok(Some(snapshot))
    }

    fn save_sync(path: &Path, snapshot: &SettingsSnapshot) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    ConvError::io(format!(
                        "Failed to create settings directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(snapshot)?;

        // Write to temporary file in the same directory
        let tmp_path = path.with_extension("json.tmp");
        let mut tmp_file = File::create(&tmp_path).map_err(|e| {
            ConvError::io(format!(
                "Failed to create temp file '{}': {}",
                tmp_path.display(),
                e
            ))
        })?;

        tmp_file.write_all(json.as_bytes()).map_err(|e| {
            ConvError::io(format!(
                "Failed to write to temp file '{}': {}",
                tmp_path.display(),
                e
            ))
        })?;

        // Ensure data is written to disk
        tmp_file.sync_all().map_err(|e| {
            ConvError::io(format!(
                "Failed to sync temp file '{}': {}",
                tmp_path.display(),
                e
            ))
        })?;

        drop(tmp_file);

        // Settings carry the provider credential
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&tmp_path, permissions).map_err(|e| {
                ConvError::io(format!(
                    "Failed to set permissions on '{}': {}",
                    tmp_path.display(),
                    e
                ))
            })?;
        }

        // Atomic rename
        fs::rename(&tmp_path, path).map_err(|e| {
            ConvError::io(format!(
                "Failed to rename temp file '{}' to '{}': {}",
                tmp_path.display(),
                path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openconv_core::provider::{ConfiguredProvider, ProviderCatalog};
    use openconv_core::settings::{MemoryConfig, MemoryKind};

    fn sample_snapshot() -> SettingsSnapshot {
        let template = ProviderCatalog::get("openrouter").unwrap();
        let mut provider = ConfiguredProvider::from_template(template);
        provider.credential = "sk-or-test".to_string();

        SettingsSnapshot {
            provider: Some(provider),
            memory: MemoryConfig::default_for(MemoryKind::Local),
        }
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalSettingsStore::with_path(temp_dir.path().join("settings.json"));

        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = LocalSettingsStore::with_path(temp_dir.path().join("settings.json"));

        let snapshot = sample_snapshot();
        store.save(&snapshot).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn test_save_creates_parent_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("deep").join("nested").join("settings.json");
        let store = LocalSettingsStore::with_path(&nested);

        store.save(&sample_snapshot()).await.unwrap();
        assert!(nested.exists());
    }

    #[tokio::test]
    async fn test_empty_file_loads_as_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, "  \n").unwrap();

        let store = LocalSettingsStore::with_path(&path);
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = LocalSettingsStore::with_path(&path);
        assert!(store.load().await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_saved_file_has_restricted_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");
        let store = LocalSettingsStore::with_path(&path);

        store.save(&sample_snapshot()).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
