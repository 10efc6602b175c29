//! Completion provider construction from process configuration.

use std::sync::Arc;

use reqwest::Client;
use tprovider::{CompletionProvider, ProviderError, ProviderId, SecureCredentialManager};

use crate::ToolwireConfig;

pub fn build_provider(
    config: &ToolwireConfig,
) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
    let credentials = Arc::new(SecureCredentialManager::new());
    if let Some(api_key) = &config.api_key {
        match config.provider {
            ProviderId::OpenAi => credentials.set_openai_api_key(api_key.expose())?,
            ProviderId::Ollama => credentials.set_api_key(ProviderId::Ollama, api_key.expose())?,
        }
    }

    let http = Client::builder()
        .timeout(config.completion_timeout)
        .build()
        .map_err(|err| ProviderError::transport(err.to_string()))?;

    build_openai_compatible(config, credentials, http)
}

#[cfg(feature = "provider-openai")]
fn build_openai_compatible(
    config: &ToolwireConfig,
    credentials: Arc<SecureCredentialManager>,
    http: Client,
) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
    use tprovider::adapters::openai::{OpenAiHttpTransport, OpenAiProvider};

    let provider = match (config.provider, config.base_url.as_deref()) {
        (ProviderId::Ollama, None) => OpenAiProvider::ollama(credentials, http),
        (id, base_url) => {
            let mut transport = OpenAiHttpTransport::new(http);
            if let Some(base_url) = base_url {
                transport = transport.with_base_url(base_url);
            }
            OpenAiProvider::new(credentials, Arc::new(transport))
                .with_id(id)
                .with_fallback_model(config.model())
        }
    };

    tracing::debug!(provider = %config.provider, model = config.model(), "built completion provider");
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "provider-openai"))]
fn build_openai_compatible(
    _config: &ToolwireConfig,
    _credentials: Arc<SecureCredentialManager>,
    _http: Client,
) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
    Err(ProviderError::invalid_request(
        "provider-openai feature is not enabled on toolwire",
    ))
}

#[cfg(test)]
mod tests {
    use tprovider::ProviderErrorKind;

    use super::*;

    #[test]
    fn openai_keys_must_look_like_openai_keys() {
        let config = ToolwireConfig::new(ProviderId::OpenAi).with_api_key("not-a-key");
        let error = build_provider(&config).err().expect("rejected key");

        assert_eq!(error.kind, ProviderErrorKind::Authentication);
    }

    #[cfg(feature = "provider-openai")]
    #[test]
    fn providers_report_their_configured_identity() {
        let openai = build_provider(&ToolwireConfig::new(ProviderId::OpenAi).with_api_key("sk-x"))
            .expect("openai provider");
        assert_eq!(openai.id(), ProviderId::OpenAi);

        let ollama = build_provider(&ToolwireConfig::new(ProviderId::Ollama)).expect("ollama");
        assert_eq!(ollama.id(), ProviderId::Ollama);

        let remote_ollama = build_provider(
            &ToolwireConfig::new(ProviderId::Ollama)
                .with_base_url("http://gpu-box:11434/v1")
                .with_api_key("token"),
        )
        .expect("remote ollama");
        assert_eq!(remote_ollama.id(), ProviderId::Ollama);
    }
}
