//! HTTP credential verification.
//!
//! Probes a cheap authenticated endpoint on the provider to confirm a
//! credential is accepted before it is ever used for a completion.

use async_trait::async_trait;
use openconv_core::error::{ConvError, Result};
use openconv_core::provider::{AuthScheme, ProviderTemplate};
use openconv_core::verifier::{CredentialVerifier, VerifiedDetails};
use regex::Regex;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Verifier that issues one GET against the template's verify endpoint.
#[derive(Clone, Default)]
pub struct HttpCredentialVerifier {
    client: Client,
}

impl HttpCredentialVerifier {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Rejects credentials that cannot possibly be valid without
    /// spending a network round trip on them.
    fn check_pattern(template: &ProviderTemplate, credential: &str) -> Result<()> {
        let Some(pattern) = template.credential_pattern else {
            return Ok(());
        };

        let regex = Regex::new(pattern).map_err(|e| {
            ConvError::internal(format!(
                "Invalid credential pattern for provider '{}': {}",
                template.id, e
            ))
        })?;

        if regex.is_match(credential) {
            Ok(())
        } else {
            Err(ConvError::verification("Invalid format"))
        }
    }

    fn apply_auth(
        request: RequestBuilder,
        scheme: AuthScheme,
        credential: &str,
    ) -> RequestBuilder {
        match scheme {
            AuthScheme::Bearer => request.bearer_auth(credential),
            AuthScheme::XApiKey => request
                .header("x-api-key", credential)
                .header("anthropic-version", ANTHROPIC_VERSION),
            AuthScheme::None => request,
        }
    }
}

#[async_trait]
impl CredentialVerifier for HttpCredentialVerifier {
    async fn verify(
        &self,
        template: &ProviderTemplate,
        credential: &str,
    ) -> Result<VerifiedDetails> {
        Self::check_pattern(template, credential)?;

        let url = format!("{}{}", template.base_url, template.verify_endpoint);
        let request = Self::apply_auth(self.client.get(&url), template.auth_scheme, credential);

        let response = request.send().await.map_err(|err| {
            ConvError::verification(format!("Verification request failed: {err}"))
        })?;

        let status = response.status();
        if status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Ok(VerifiedDetails {
                label: parse_account_label(&body),
            });
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        Err(map_verification_error(status, body))
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct CreditsResponse {
    data: CreditsData,
}

#[derive(Deserialize)]
struct CreditsData {
    total_credits: f64,
    total_usage: f64,
}

/// Pulls a human-readable account label out of the verify response.
///
/// Only the OpenRouter credits shape is recognized today; anything else
/// verifies fine without a label.
fn parse_account_label(body: &str) -> Option<String> {
    let credits: CreditsResponse = serde_json::from_str(body).ok()?;
    let remaining = credits.data.total_credits - credits.data.total_usage;
    Some(format!("{remaining:.2} credits remaining"))
}

fn map_verification_error(status: StatusCode, body: String) -> ConvError {
    let detail = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ConvError::verification(format!(
            "Credential rejected ({}): {}",
            status.as_u16(),
            detail
        )),
        _ => ConvError::verification(format!(
            "Verification failed ({}): {}",
            status.as_u16(),
            detail
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use openconv_core::provider::ProviderCatalog;

    #[test]
    fn test_pattern_mismatch_is_invalid_format() {
        let template = ProviderCatalog::get("openrouter").unwrap();
        let err = HttpCredentialVerifier::check_pattern(template, "bad-format").unwrap_err();

        assert!(err.is_verification());
        assert!(matches!(
            err,
            ConvError::Verification(message) if message == "Invalid format"
        ));
    }

    #[test]
    fn test_pattern_match_passes_precheck() {
        let template = ProviderCatalog::get("openrouter").unwrap();
        assert!(HttpCredentialVerifier::check_pattern(template, "sk-or-v1-abc123").is_ok());
    }

    #[test]
    fn test_no_pattern_accepts_anything() {
        let template = ProviderCatalog::get("ollama").unwrap();
        assert!(HttpCredentialVerifier::check_pattern(template, "").is_ok());
    }

    #[test]
    fn test_account_label_from_credits_body() {
        let body = r#"{"data":{"total_credits":25.0,"total_usage":5.5}}"#;
        assert_eq!(
            parse_account_label(body),
            Some("19.50 credits remaining".to_string())
        );
    }

    #[test]
    fn test_unrecognized_verify_body_has_no_label() {
        assert_eq!(parse_account_label(r#"{"object":"list","data":[]}"#), None);
    }

    #[test]
    fn test_error_mapping_prefers_provider_message() {
        let body = r#"{"error":{"message":"User not found."}}"#.to_string();
        let err = map_verification_error(StatusCode::UNAUTHORIZED, body);

        let message = err.to_string();
        assert!(message.contains("Credential rejected (401)"), "{message}");
        assert!(message.contains("User not found."), "{message}");
    }

    #[test]
    fn test_error_mapping_falls_back_to_raw_body() {
        let err = map_verification_error(StatusCode::BAD_GATEWAY, "upstream down".to_string());
        assert!(err.to_string().contains("Verification failed (502)"));
    }
}
