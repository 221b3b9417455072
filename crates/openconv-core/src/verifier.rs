//! Credential verification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::provider::ProviderTemplate;

/// What a provider reports about an accepted credential.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifiedDetails {
    /// Account or plan label, when the provider exposes one.
    pub label: Option<String>,
}

/// Checks a credential against its provider.
///
/// Implementations must not retain the credential and must keep it out
/// of error messages.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Returns `Ok` when the provider accepts the credential.
    ///
    /// Rejections and transport failures both surface as
    /// [`ConvError::Verification`](crate::error::ConvError::Verification);
    /// callers only need the recorded reason.
    async fn verify(&self, template: &ProviderTemplate, credential: &str)
    -> Result<VerifiedDetails>;
}
