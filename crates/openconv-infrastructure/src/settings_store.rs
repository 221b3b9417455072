//! Dual-backend settings persistence.
//!
//! Writes prefer the host bridge and degrade to the local file without
//! surfacing an error; only the loss of both backends is reported.

use std::sync::Arc;

use openconv_core::bridge::SettingsBridge;
use openconv_core::error::{ConvError, Result};
use openconv_core::settings::SettingsSnapshot;

use crate::local_store::LocalSettingsStore;

/// Settings persistence over a primary host bridge and a local fallback.
///
/// The primary backend is optional: headless builds and tests run with
/// the local file alone.
#[derive(Clone)]
pub struct SettingsStore {
    primary: Option<Arc<dyn SettingsBridge>>,
    fallback: LocalSettingsStore,
}

impl SettingsStore {
    /// Store backed by the local file only.
    pub fn new(fallback: LocalSettingsStore) -> Self {
        Self {
            primary: None,
            fallback,
        }
    }

    /// Store that prefers the host bridge and keeps the local file as
    /// fallback.
    pub fn with_bridge(bridge: Arc<dyn SettingsBridge>, fallback: LocalSettingsStore) -> Self {
        Self {
            primary: Some(bridge),
            fallback,
        }
    }

    /// Loads the stored snapshot.
    ///
    /// A failing or empty primary backend falls through to the local
    /// file. `Err` means the local file itself could not be read.
    pub async fn load(&self) -> Result<Option<SettingsSnapshot>> {
        if let Some(bridge) = &self.primary {
            match bridge.load_settings().await {
                Ok(Some(snapshot)) => return Ok(Some(snapshot)),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        "Primary settings backend failed to load, using local file: {}",
                        e
                    );
                }
            }
        }

        self.fallback.load().await
    }

    /// Persists the snapshot.
    ///
    /// The write succeeds if either backend accepts it. Both backends
    /// failing surfaces one aggregated persistence error.
    pub async fn save(&self, snapshot: &SettingsSnapshot) -> Result<()> {
        let primary_err = match &self.primary {
            Some(bridge) => match bridge.save_settings(snapshot).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        "Primary settings backend failed to save, using local file: {}",
                        e
                    );
                    Some(e)
                }
            },
            None => None,
        };

        match self.fallback.save(snapshot).await {
            Ok(()) => Ok(()),
            Err(fallback_err) => match primary_err {
                Some(primary_err) => Err(ConvError::persistence(format!(
                    "all settings backends failed: primary: {}; local file: {}",
                    primary_err, fallback_err
                ))),
                None => Err(ConvError::persistence(format!(
                    "local settings file could not be written: {}",
                    fallback_err
                ))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use openconv_core::settings::{MemoryConfig, MemoryKind};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Bridge that remembers the last saved snapshot.
    #[derive(Default)]
    struct WorkingBridge {
        stored: Mutex<Option<SettingsSnapshot>>,
        saves: AtomicUsize,
    }

    #[async_trait]
    impl SettingsBridge for WorkingBridge {
        async fn load_settings(&self) -> anyhow::Result<Option<SettingsSnapshot>> {
            Ok(self.stored.lock().await.clone())
        }

        async fn save_settings(&self, snapshot: &SettingsSnapshot) -> anyhow::Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            *self.stored.lock().await = Some(snapshot.clone());
            Ok(())
        }
    }

    /// Bridge that always fails, like a shell without the settings API.
    struct BrokenBridge;

    #[async_trait]
    impl SettingsBridge for BrokenBridge {
        async fn load_settings(&self) -> anyhow::Result<Option<SettingsSnapshot>> {
            anyhow::bail!("bridge unavailable")
        }

        async fn save_settings(&self, _snapshot: &SettingsSnapshot) -> anyhow::Result<()> {
            anyhow::bail!("bridge unavailable")
        }
    }

    fn sample_snapshot() -> SettingsSnapshot {
        SettingsSnapshot {
            provider: None,
            memory: MemoryConfig::default_for(MemoryKind::Remote),
        }
    }

    fn local_store_in(dir: &tempfile::TempDir) -> LocalSettingsStore {
        LocalSettingsStore::with_path(dir.path().join("settings.json"))
    }

    /// Local store whose parent "directory" is a plain file, so every
    /// write fails.
    fn unwritable_store(dir: &tempfile::TempDir) -> LocalSettingsStore {
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        LocalSettingsStore::with_path(blocker.join("settings.json"))
    }

    #[tokio::test]
    async fn test_save_prefers_primary() {
        let temp_dir = tempfile::tempdir().unwrap();
        let bridge = Arc::new(WorkingBridge::default());
        let store = SettingsStore::with_bridge(bridge.clone(), local_store_in(&temp_dir));

        store.save(&sample_snapshot()).await.unwrap();

        assert_eq!(bridge.saves.load(Ordering::SeqCst), 1);
        // Fallback untouched on a primary success
        assert!(!temp_dir.path().join("settings.json").exists());
    }

    #[tokio::test]
    async fn test_save_degrades_to_fallback_silently() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::with_bridge(Arc::new(BrokenBridge), local_store_in(&temp_dir));

        store.save(&sample_snapshot()).await.unwrap();

        assert!(temp_dir.path().join("settings.json").exists());
    }

    #[tokio::test]
    async fn test_save_reports_aggregate_when_both_fail() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::with_bridge(Arc::new(BrokenBridge), unwritable_store(&temp_dir));

        let err = store.save(&sample_snapshot()).await.unwrap_err();
        assert!(err.is_persistence());
        let message = err.to_string();
        assert!(message.contains("bridge unavailable"), "{message}");
        assert!(message.contains("local file"), "{message}");
    }

    #[tokio::test]
    async fn test_load_falls_through_empty_primary() {
        let temp_dir = tempfile::tempdir().unwrap();
        let local = local_store_in(&temp_dir);
        local.save(&sample_snapshot()).await.unwrap();

        let store = SettingsStore::with_bridge(Arc::new(WorkingBridge::default()), local);
        let loaded = store.load().await.unwrap().unwrap();

        assert_eq!(loaded.memory.kind(), MemoryKind::Remote);
    }

    #[tokio::test]
    async fn test_load_degrades_on_primary_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let local = local_store_in(&temp_dir);
        local.save(&sample_snapshot()).await.unwrap();

        let store = SettingsStore::with_bridge(Arc::new(BrokenBridge), local);
        assert!(store.load().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_load_with_nothing_stored_is_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(local_store_in(&temp_dir));

        assert_eq!(store.load().await.unwrap(), None);
    }
}
