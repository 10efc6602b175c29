//! Chat-completions provider over an injectable transport.

use std::sync::Arc;

use crate::{
    Completion, CompletionProvider, CompletionRequest, ProviderError, ProviderFuture, ProviderId,
    SecureCredentialManager,
};

use super::auth::{DEFAULT_OLLAMA_BASE_URL, resolve_auth};
use super::transport::{OpenAiHttpTransport, OpenAiTransport};
use super::types::{OpenAiMessage, OpenAiRequest};

/// Speaks the OpenAI chat-completions dialect. The same adapter serves
/// Ollama through its OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAiProvider {
    id: ProviderId,
    credentials: Arc<SecureCredentialManager>,
    transport: Arc<dyn OpenAiTransport>,
    fallback_model: String,
}

impl OpenAiProvider {
    pub fn new(
        credentials: Arc<SecureCredentialManager>,
        transport: Arc<dyn OpenAiTransport>,
    ) -> Self {
        Self {
            id: ProviderId::OpenAi,
            credentials,
            transport,
            fallback_model: "gpt-4o-mini".to_string(),
        }
    }

    pub fn ollama(credentials: Arc<SecureCredentialManager>, client: reqwest::Client) -> Self {
        let transport = OpenAiHttpTransport::new(client).with_base_url(DEFAULT_OLLAMA_BASE_URL);
        Self::new(credentials, Arc::new(transport))
            .with_id(ProviderId::Ollama)
            .with_fallback_model("llama3.2")
    }

    pub fn with_id(mut self, id: ProviderId) -> Self {
        self.id = id;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn OpenAiTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    pub(crate) fn build_openai_request(&self, request: CompletionRequest) -> OpenAiRequest {
        let model = if request.model.trim().is_empty() {
            self.fallback_model.clone()
        } else {
            request.model
        };

        OpenAiRequest {
            model,
            messages: request
                .messages
                .into_iter()
                .map(OpenAiMessage::from)
                .collect(),
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
            json_mode: request.json_mode,
        }
    }
}

impl CompletionProvider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn complete<'a>(
        &'a self,
        request: CompletionRequest,
    ) -> ProviderFuture<'a, Result<Completion, ProviderError>> {
        Box::pin(async move {
            let mut request = request;
            if request.model.trim().is_empty() {
                request.model = self.fallback_model.clone();
            }
            request.validate()?;

            let auth = resolve_auth(self.id, &self.credentials)?;
            let openai_request = self.build_openai_request(request);
            let response = self.transport.complete(openai_request, auth).await?;
            Ok(response.into_completion(self.id))
        })
    }
}
