//! Credential helpers and auth resolution policy.

use crate::{ProviderError, ProviderId, SecureCredentialManager};

use super::types::OpenAiAuth;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

impl SecureCredentialManager {
    /// Stores an OpenAI API key for provider-authenticated requests.
    ///
    /// OpenAI keys are expected to start with `sk-`.
    pub fn set_openai_api_key(&self, api_key: impl Into<String>) -> Result<(), ProviderError> {
        let api_key = api_key.into();
        if !api_key.starts_with("sk-") {
            return Err(ProviderError::authentication(
                "OpenAI API key must start with 'sk-'",
            ));
        }

        self.set_api_key(ProviderId::OpenAi, api_key)
    }
}

/// OpenAI requires a key; Ollama sends one only when configured.
pub(crate) fn resolve_auth(
    provider: ProviderId,
    credentials: &SecureCredentialManager,
) -> Result<OpenAiAuth, ProviderError> {
    match (provider, credentials.api_key(provider)?) {
        (_, Some(api_key)) => Ok(OpenAiAuth::ApiKey(api_key)),
        (ProviderId::Ollama, None) => Ok(OpenAiAuth::None),
        (ProviderId::OpenAi, None) => {
            Err(ProviderError::authentication("no OpenAI API key configured"))
        }
    }
}
