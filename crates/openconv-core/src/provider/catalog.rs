//! Built-in provider catalog.
//!
//! Templates are compiled in and immutable; user-editable state lives on
//! [`ConfiguredProvider`](super::model::ConfiguredProvider).

/// How a provider expects its credential on verification requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <credential>`
    Bearer,
    /// `x-api-key: <credential>` plus an `anthropic-version` header
    XApiKey,
    /// No credential header is sent
    None,
}

/// Immutable description of a supported LLM provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderTemplate {
    /// Stable identifier, also used as the persisted provider id
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// API root, without a trailing slash
    pub base_url: &'static str,
    /// Whether a credential must be verified before use
    pub requires_auth: bool,
    /// Shape check applied to the credential before any network call
    pub credential_pattern: Option<&'static str>,
    /// Path probed during verification, relative to `base_url`
    pub verify_endpoint: &'static str,
    pub auth_scheme: AuthScheme,
    pub default_model: &'static str,
}

static CATALOG: [ProviderTemplate; 4] = [
    ProviderTemplate {
        id: "openrouter",
        name: "OpenRouter",
        base_url: "https://openrouter.ai/api/v1",
        requires_auth: true,
        credential_pattern: Some("^sk-or-"),
        verify_endpoint: "/credits",
        auth_scheme: AuthScheme::Bearer,
        default_model: "openrouter/auto",
    },
    ProviderTemplate {
        id: "openai",
        name: "OpenAI",
        base_url: "https://api.openai.com/v1",
        requires_auth: true,
        credential_pattern: Some("^sk-"),
        verify_endpoint: "/models",
        auth_scheme: AuthScheme::Bearer,
        default_model: "gpt-4o",
    },
    ProviderTemplate {
        id: "anthropic",
        name: "Anthropic",
        base_url: "https://api.anthropic.com/v1",
        requires_auth: true,
        credential_pattern: Some("^sk-ant-"),
        verify_endpoint: "/models",
        auth_scheme: AuthScheme::XApiKey,
        default_model: "claude-sonnet-4-20250514",
    },
    ProviderTemplate {
        id: "ollama",
        name: "Ollama",
        base_url: "http://localhost:11434/v1",
        requires_auth: false,
        credential_pattern: None,
        verify_endpoint: "/models",
        auth_scheme: AuthScheme::None,
        default_model: "llama3.1",
    },
];

/// Read-only access to the compiled-in templates.
pub struct ProviderCatalog;

impl ProviderCatalog {
    /// All known templates, in display order.
    pub fn all() -> &'static [ProviderTemplate] {
        &CATALOG
    }

    /// Looks up a template by its stable id.
    pub fn get(id: &str) -> Option<&'static ProviderTemplate> {
        CATALOG.iter().find(|t| t.id == id)
    }
}
