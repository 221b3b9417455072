//! Provider configuration state machine.
//!
//! Owns the single active provider, its verification status, and the
//! memory configuration, and orchestrates the verify / auto-save / cache
//! invalidation transitions between them.
//!
//! # Locking
//!
//! All mutable state sits behind one mutex that is never held across an
//! await. The async operations (`load`, `verify`, `save`) snapshot what
//! they need, release the lock for the slow call, then re-acquire and
//! re-check before committing, so a result that arrives after the user
//! has moved on is discarded instead of clobbering newer state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use openconv_core::error::{ConvError, Result};
use openconv_core::provider::{ConfiguredProvider, ProviderCatalog, VerificationStatus};
use openconv_core::settings::{MemoryConfig, MemoryKind, SettingsSnapshot};
use openconv_core::verifier::CredentialVerifier;
use openconv_infrastructure::SettingsStore;

use crate::agent::AgentSessionCache;

/// How long a save notice stays visible.
const NOTICE_TTL: Duration = Duration::from_secs(3);

/// Kind of transient save notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Saved,
    Error,
}

/// Transient user-visible message emitted after a save attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveNotice {
    pub kind: NoticeKind,
    pub message: String,
}

struct ControllerState {
    provider: Option<ConfiguredProvider>,
    memory: MemoryConfig,
    status: VerificationStatus,
    /// Credential value the current `Verified` status belongs to
    last_verified_credential: Option<String>,
    /// Account detail reported by the last successful verification,
    /// e.g. remaining credits. Transient, never persisted.
    verified_label: Option<String>,
    /// Provider as it exists in storage, for re-adoption on re-select
    persisted_provider: Option<ConfiguredProvider>,
    unsaved: bool,
    saving: bool,
    /// Bumped on every user edit so async completions can tell whether
    /// an edit landed while they were in flight
    edit_seq: u64,
    notice: Option<SaveNotice>,
    /// Bumped per notice so an expiry task only clears its own notice
    notice_seq: u64,
    load_error: Option<String>,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            provider: None,
            memory: MemoryConfig::default(),
            status: VerificationStatus::Idle,
            last_verified_credential: None,
            verified_label: None,
            persisted_provider: None,
            unsaved: false,
            saving: false,
            edit_seq: 0,
            notice: None,
            notice_seq: 0,
            load_error: None,
        }
    }
}

fn no_provider_selected() -> ConvError {
    ConvError::configuration("No provider selected")
}

/// The configuration state machine.
///
/// Constructed once per application and shared via `Arc`; all methods
/// take `&self`.
pub struct ConfigController {
    state: Arc<Mutex<ControllerState>>,
    verifier: Arc<dyn CredentialVerifier>,
    store: SettingsStore,
    cache: Arc<AgentSessionCache>,
}

impl ConfigController {
    pub fn new(
        verifier: Arc<dyn CredentialVerifier>,
        store: SettingsStore,
        cache: Arc<AgentSessionCache>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ControllerState::default())),
            verifier,
            store,
            cache,
        }
    }

    // ============================================================================
    // Reads
    // ============================================================================

    pub fn current_provider(&self) -> Option<ConfiguredProvider> {
        self.state.lock().unwrap().provider.clone()
    }

    pub fn status(&self) -> VerificationStatus {
        self.state.lock().unwrap().status
    }

    pub fn memory_config(&self) -> MemoryConfig {
        self.state.lock().unwrap().memory.clone()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.state.lock().unwrap().unsaved
    }

    pub fn notice(&self) -> Option<SaveNotice> {
        self.state.lock().unwrap().notice.clone()
    }

    /// Non-fatal error recorded when the last `load` fell back to
    /// defaults.
    pub fn load_error(&self) -> Option<String> {
        self.state.lock().unwrap().load_error.clone()
    }

    /// Account detail from the last successful verification, if the
    /// endpoint reported one.
    pub fn verification_label(&self) -> Option<String> {
        self.state.lock().unwrap().verified_label.clone()
    }

    /// The snapshot a save would persist right now.
    pub fn snapshot(&self) -> SettingsSnapshot {
        let state = self.state.lock().unwrap();
        SettingsSnapshot {
            provider: state.provider.clone(),
            memory: state.memory.clone(),
        }
    }

    // ============================================================================
    // Lifecycle
    // ============================================================================

    /// Loads settings from the store and adopts them.
    ///
    /// Never fails: a read error is recorded as a non-fatal load error
    /// and the controller starts from the default snapshot. The initial
    /// verification status is derived from the stored provider.
    pub async fn load(&self) -> SettingsSnapshot {
        let (loaded, load_error) = match self.store.load().await {
            Ok(Some(snapshot)) => (snapshot, None),
            Ok(None) => (SettingsSnapshot::default(), None),
            Err(e) => {
                tracing::warn!("Failed to load settings, starting from defaults: {}", e);
                (SettingsSnapshot::default(), Some(e.to_string()))
            }
        };

        let mut state = self.state.lock().unwrap();
        state.provider = loaded.provider.clone();
        state.persisted_provider = loaded.provider.clone();
        state.memory = loaded.memory.clone();
        state.status = loaded
            .provider
            .as_ref()
            .map_or(VerificationStatus::Idle, |p| p.stored_status());
        state.last_verified_credential = loaded
            .provider
            .as_ref()
            .filter(|p| p.verified)
            .map(|p| p.credential.clone());
        state.verified_label = None;
        state.unsaved = false;
        state.load_error = load_error;
        self.cache.invalidate_all();

        loaded
    }

    // ============================================================================
    // Mutators (synchronous; cache invalidation happens in the same
    // transition)
    // ============================================================================

    /// Selects a provider from the catalog, or clears the selection.
    ///
    /// Re-selecting the id of the persisted provider re-adopts its
    /// stored verification state when a credential is present in
    /// storage; anything else starts fresh and unverified.
    pub fn select_provider(&self, provider_id: Option<&str>) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        match provider_id {
            None => {
                state.provider = None;
                state.status = VerificationStatus::Idle;
                state.last_verified_credential = None;
                state.verified_label = None;
            }
            Some(id) => {
                let template = ProviderCatalog::get(id)
                    .ok_or_else(|| ConvError::not_found("provider", id))?;

                let provider = state
                    .persisted_provider
                    .as_ref()
                    .filter(|p| p.id == id && !p.credential.is_empty())
                    .cloned()
                    .unwrap_or_else(|| ConfiguredProvider::from_template(template));

                state.status = provider.stored_status();
                state.last_verified_credential =
                    provider.verified.then(|| provider.credential.clone());
                state.verified_label = None;
                state.provider = Some(provider);
            }
        }

        state.unsaved = true;
        state.edit_seq += 1;
        self.cache.invalidate_all();
        Ok(())
    }

    /// Updates the credential on the selected provider.
    ///
    /// A changed credential is never implicitly verified: status drops
    /// back to `idle` and the previous verification result is discarded.
    pub fn set_credential(&self, value: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let provider = state.provider.as_mut().ok_or_else(no_provider_selected)?;

        provider.credential = value.to_string();
        provider.verified = false;
        provider.verification_error = None;
        provider.last_verified_at = None;

        state.status = VerificationStatus::Idle;
        state.verified_label = None;
        state.unsaved = true;
        state.edit_seq += 1;
        self.cache.invalidate_all();
        Ok(())
    }

    /// Flips `enabled` on the selected provider. Verification status is
    /// untouched.
    pub fn toggle_enabled(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let provider = state.provider.as_mut().ok_or_else(no_provider_selected)?;

        provider.enabled = !provider.enabled;

        state.unsaved = true;
        state.edit_seq += 1;
        self.cache.invalidate_all();
        Ok(())
    }

    /// Points the selected provider at a different model.
    pub fn set_model(&self, model: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let provider = state.provider.as_mut().ok_or_else(no_provider_selected)?;

        provider.model = model.to_string();

        state.unsaved = true;
        state.edit_seq += 1;
        self.cache.invalidate_all();
        Ok(())
    }

    /// Replaces the memory configuration with defaults for `kind`.
    ///
    /// Switching kinds resets parameters rather than merging; the two
    /// kinds have disjoint schemas.
    pub fn set_memory_provider(&self, kind: MemoryKind) {
        let mut state = self.state.lock().unwrap();
        let kind_changed = state.memory.kind() != kind;

        state.memory = MemoryConfig::default_for(kind);
        state.unsaved = true;
        state.edit_seq += 1;

        if kind_changed {
            self.cache.invalidate_all();
        }
    }

    /// Sets one parameter on the current memory configuration.
    pub fn update_memory_param(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.memory.set_param(key, value)?;
        state.unsaved = true;
        state.edit_seq += 1;
        Ok(())
    }

    // ============================================================================
    // Async operations
    // ============================================================================

    /// Runs credential verification for the selected provider.
    ///
    /// The guard makes this a no-op (without touching the verifier)
    /// when no provider is selected, the provider needs no auth, a
    /// check is already in flight, or the current credential is the one
    /// already verified. A failed previous attempt re-verifies.
    ///
    /// On success the credential is marked verified and, when there are
    /// unsaved changes, persisted immediately; on failure the status
    /// moves to `error` with the reason recorded on the provider.
    pub async fn verify(&self) -> Result<()> {
        let (template, credential) = {
            let mut state = self.state.lock().unwrap();
            let Some(provider) = state.provider.as_ref() else {
                return Ok(());
            };

            if !provider.requires_auth {
                return Ok(());
            }
            if state.status == VerificationStatus::Checking {
                return Ok(());
            }
            let credential_unchanged =
                state.last_verified_credential.as_deref() == Some(provider.credential.as_str());
            if state.status == VerificationStatus::Verified && credential_unchanged {
                return Ok(());
            }

            let template = *ProviderCatalog::get(&provider.id).ok_or_else(|| {
                ConvError::configuration(format!("Unknown provider '{}'", provider.id))
            })?;
            let credential = provider.credential.clone();

            state.status = VerificationStatus::Checking;
            (template, credential)
        };

        let outcome = self.verifier.verify(&template, &credential).await;

        let auto_save = {
            let mut state = self.state.lock().unwrap();

            // The user may have switched providers or edited the
            // credential while the check was in flight; that state
            // already moved on, so the result is dropped.
            let stale = state
                .provider
                .as_ref()
                .is_none_or(|p| p.id != template.id || p.credential != credential);
            if stale {
                return Ok(());
            }

            match &outcome {
                Ok(details) => {
                    if let Some(provider) = state.provider.as_mut() {
                        provider.verified = true;
                        provider.verification_error = None;
                        provider.last_verified_at = Some(Utc::now());
                    }
                    state.status = VerificationStatus::Verified;
                    state.last_verified_credential = Some(credential);
                    state.verified_label = details.label.clone();
                    tracing::debug!("Provider '{}' verified", template.id);
                    state.unsaved && !state.saving
                }
                Err(err) => {
                    let reason = match err {
                        ConvError::Verification(message) => message.clone(),
                        other => other.to_string(),
                    };
                    tracing::debug!(
                        "Provider '{}' verification failed: {}",
                        template.id,
                        reason
                    );
                    if let Some(provider) = state.provider.as_mut() {
                        provider.verified = false;
                        provider.verification_error = Some(reason);
                    }
                    state.status = VerificationStatus::Error;
                    state.verified_label = None;
                    false
                }
            }
        };

        if auto_save {
            if let Err(err) = self.save().await {
                tracing::warn!("Auto-save after verification failed: {}", err);
            }
        }

        outcome.map(|_| ())
    }

    /// Persists the current snapshot through the settings store.
    ///
    /// A save already in flight makes this call a no-op. On completion
    /// the unsaved flag is only cleared when no edit happened while the
    /// write was in flight. Either outcome emits a transient notice
    /// that clears itself after a few seconds.
    pub async fn save(&self) -> Result<()> {
        let (snapshot, seq_at_start) = {
            let mut state = self.state.lock().unwrap();
            if state.saving {
                return Ok(());
            }
            state.saving = true;

            let snapshot = SettingsSnapshot {
                provider: state.provider.clone(),
                memory: state.memory.clone(),
            };
            (snapshot, state.edit_seq)
        };

        let result = self.store.save(&snapshot).await;

        let notice_seq = {
            let mut state = self.state.lock().unwrap();
            state.saving = false;

            match &result {
                Ok(()) => {
                    if state.edit_seq == seq_at_start {
                        state.unsaved = false;
                    }
                    state.persisted_provider = snapshot.provider.clone();
                    state.notice = Some(SaveNotice {
                        kind: NoticeKind::Saved,
                        message: "Settings saved".to_string(),
                    });
                }
                Err(err) => {
                    state.notice = Some(SaveNotice {
                        kind: NoticeKind::Error,
                        message: err.to_string(),
                    });
                }
            }

            state.notice_seq += 1;
            state.notice_seq
        };

        self.schedule_notice_expiry(notice_seq);

        result
    }

    /// Clears the notice after its TTL unless a newer notice replaced
    /// it in the meantime.
    fn schedule_notice_expiry(&self, seq: u64) {
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(NOTICE_TTL).await;
            let mut state = state.lock().unwrap();
            if state.notice_seq == seq {
                state.notice = None;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use openconv_core::provider::ProviderTemplate;
    use openconv_core::verifier::VerifiedDetails;
    use openconv_infrastructure::LocalSettingsStore;

    struct NullVerifier;

    #[async_trait]
    impl CredentialVerifier for NullVerifier {
        async fn verify(
            &self,
            _template: &ProviderTemplate,
            _credential: &str,
        ) -> Result<VerifiedDetails> {
            Ok(VerifiedDetails::default())
        }
    }

    struct NullBackend;

    #[async_trait]
    impl openconv_core::backend::ChatBackend for NullBackend {
        async fn send_completion(
            &self,
            _messages: &[openconv_core::backend::PromptMessage],
            _model: &openconv_core::backend::ModelConfig,
        ) -> Result<String> {
            Ok(String::new())
        }
    }

    fn controller(dir: &tempfile::TempDir) -> ConfigController {
        let store = SettingsStore::new(LocalSettingsStore::with_path(
            dir.path().join("settings.json"),
        ));
        let cache = Arc::new(AgentSessionCache::new(crate::agent::AgentFactory::new(
            Arc::new(NullBackend),
        )));
        ConfigController::new(Arc::new(NullVerifier), store, cache)
    }

    #[tokio::test]
    async fn test_select_then_clear_resets_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(&dir);

        controller.select_provider(Some("openrouter")).unwrap();
        assert_eq!(controller.status(), VerificationStatus::Idle);
        assert!(controller.has_unsaved_changes());

        controller.select_provider(None).unwrap();
        assert_eq!(controller.status(), VerificationStatus::Idle);
        assert!(controller.current_provider().is_none());
    }

    #[tokio::test]
    async fn test_select_unknown_provider_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(&dir);

        let err = controller.select_provider(Some("acme-llm")).unwrap_err();
        assert!(err.is_not_found());
        assert!(controller.current_provider().is_none());
    }

    #[tokio::test]
    async fn test_auth_free_provider_selects_as_verified() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(&dir);

        controller.select_provider(Some("ollama")).unwrap();
        assert_eq!(controller.status(), VerificationStatus::Verified);
    }

    #[tokio::test]
    async fn test_set_credential_requires_selection() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(&dir);

        let err = controller.set_credential("sk-or-x").unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_set_credential_discards_previous_verification() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(&dir);

        controller.select_provider(Some("openrouter")).unwrap();
        controller.set_credential("sk-or-first").unwrap();
        controller.verify().await.unwrap();
        assert_eq!(controller.status(), VerificationStatus::Verified);

        controller.set_credential("sk-or-second").unwrap();

        assert_eq!(controller.status(), VerificationStatus::Idle);
        let provider = controller.current_provider().unwrap();
        assert!(!provider.verified);
        assert!(provider.verification_error.is_none());
        assert!(provider.last_verified_at.is_none());
    }

    #[tokio::test]
    async fn test_toggle_enabled_leaves_verification_alone() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(&dir);

        controller.select_provider(Some("ollama")).unwrap();
        controller.toggle_enabled().unwrap();

        let provider = controller.current_provider().unwrap();
        assert!(!provider.enabled);
        assert_eq!(controller.status(), VerificationStatus::Verified);
    }

    #[tokio::test]
    async fn test_memory_kind_switch_resets_params() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(&dir);

        controller.set_memory_provider(MemoryKind::Remote);
        controller
            .update_memory_param("endpoint", "https://memory.example")
            .unwrap();

        controller.set_memory_provider(MemoryKind::Local);
        controller.set_memory_provider(MemoryKind::Remote);

        assert_eq!(
            controller.memory_config(),
            MemoryConfig::default_for(MemoryKind::Remote)
        );
    }

    #[tokio::test]
    async fn test_update_memory_param_rejects_foreign_key() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(&dir);

        let err = controller.update_memory_param("endpoint", "x").unwrap_err();
        assert!(err.is_configuration());
        assert!(!controller.has_unsaved_changes());
    }

    #[tokio::test]
    async fn test_load_failure_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ broken").unwrap();

        let store = SettingsStore::new(LocalSettingsStore::with_path(&path));
        let cache = Arc::new(AgentSessionCache::new(crate::agent::AgentFactory::new(
            Arc::new(NullBackend),
        )));
        let controller = ConfigController::new(Arc::new(NullVerifier), store, cache);

        let snapshot = controller.load().await;

        assert!(snapshot.provider.is_none());
        assert_eq!(controller.status(), VerificationStatus::Idle);
        assert!(controller.load_error().is_some());
        assert!(!controller.has_unsaved_changes());
    }

    #[tokio::test]
    async fn test_snapshot_reflects_current_edits() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(&dir);

        controller.select_provider(Some("openai")).unwrap();
        controller.set_credential("sk-123").unwrap();
        controller.set_model("gpt-4o-mini").unwrap();

        let snapshot = controller.snapshot();
        let provider = snapshot.provider.unwrap();
        assert_eq!(provider.id, "openai");
        assert_eq!(provider.credential, "sk-123");
        assert_eq!(provider.model, "gpt-4o-mini");
    }
}
