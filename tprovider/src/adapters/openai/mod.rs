mod auth;
mod provider;
mod serde_api;
mod transport;
mod types;

pub use auth::{DEFAULT_OLLAMA_BASE_URL, DEFAULT_OPENAI_BASE_URL};
pub use provider::OpenAiProvider;
pub use transport::{OpenAiHttpTransport, OpenAiTransport, error_for_status};
pub use types::{
    OpenAiAuth, OpenAiFinishReason, OpenAiMessage, OpenAiRequest, OpenAiResponse, OpenAiRole,
    OpenAiUsage,
};
