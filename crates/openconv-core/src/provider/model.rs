//! Configured provider state and the verification lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::ProviderTemplate;

/// Lifecycle of the active provider's credential check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// No check has run for the current credential
    Idle,
    /// A check is in flight
    Checking,
    /// The provider accepted the credential
    Verified,
    /// The last check failed; the reason is recorded on the provider
    Error,
}

/// The selected provider as the user has configured it.
///
/// Template fields are copied in at selection time so the persisted
/// snapshot stays self-contained and readable without the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredProvider {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub requires_auth: bool,
    #[serde(default)]
    pub credential: String,
    pub model: String,
    pub enabled: bool,
    pub verified: bool,
    #[serde(default)]
    pub last_verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verification_error: Option<String>,
}

impl ConfiguredProvider {
    /// Fresh state for a template the user just selected.
    ///
    /// Providers that take no credential start out verified.
    pub fn from_template(template: &ProviderTemplate) -> Self {
        Self {
            id: template.id.to_string(),
            name: template.name.to_string(),
            base_url: template.base_url.to_string(),
            requires_auth: template.requires_auth,
            credential: String::new(),
            model: template.default_model.to_string(),
            enabled: true,
            verified: !template.requires_auth,
            last_verified_at: None,
            verification_error: None,
        }
    }

    /// Status to adopt when this provider is loaded from storage or
    /// freshly selected.
    pub fn stored_status(&self) -> VerificationStatus {
        if self.verified {
            VerificationStatus::Verified
        } else if self.verification_error.is_some() {
            VerificationStatus::Error
        } else {
            VerificationStatus::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::catalog::ProviderCatalog;

    #[test]
    fn test_from_template_starts_unverified_when_auth_required() {
        let template = ProviderCatalog::get("openrouter").unwrap();
        let provider = ConfiguredProvider::from_template(template);

        assert_eq!(provider.id, "openrouter");
        assert_eq!(provider.model, "openrouter/auto");
        assert!(provider.enabled);
        assert!(!provider.verified);
        assert_eq!(provider.stored_status(), VerificationStatus::Idle);
    }

    #[test]
    fn test_from_template_auth_free_starts_verified() {
        let template = ProviderCatalog::get("ollama").unwrap();
        let provider = ConfiguredProvider::from_template(template);

        assert!(provider.verified);
        assert_eq!(provider.stored_status(), VerificationStatus::Verified);
    }

    #[test]
    fn test_stored_status_prefers_verified_over_error() {
        let template = ProviderCatalog::get("openai").unwrap();
        let mut provider = ConfiguredProvider::from_template(template);

        provider.verification_error = Some("nope".to_string());
        assert_eq!(provider.stored_status(), VerificationStatus::Error);

        provider.verified = true;
        assert_eq!(provider.stored_status(), VerificationStatus::Verified);
    }
}
