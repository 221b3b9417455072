//! Host settings bridge.

use anyhow::Result;
use async_trait::async_trait;

use crate::settings::SettingsSnapshot;

/// Primary settings backend, implemented by the native host shell.
///
/// Errors are opaque `anyhow` values on purpose: the runtime never
/// inspects why the host failed, it only decides whether to fall back
/// to local storage.
#[async_trait]
pub trait SettingsBridge: Send + Sync {
    /// Loads the stored snapshot. `Ok(None)` means nothing has been
    /// saved yet, which is not an error.
    async fn load_settings(&self) -> Result<Option<SettingsSnapshot>>;

    /// Persists the snapshot, replacing any previous one.
    async fn save_settings(&self, snapshot: &SettingsSnapshot) -> Result<()>;
}
