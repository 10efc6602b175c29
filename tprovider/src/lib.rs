//! Text-completion providers used by the intent resolver.

mod credentials;
mod error;
mod hooks;
mod model;
mod provider;

pub mod adapters;

pub mod prelude {
    pub use crate::{
        Completion, CompletionProvider, CompletionRequest, Message, ProviderError,
        ProviderErrorKind, ProviderFuture, ProviderId, Role,
    };

    #[cfg(feature = "provider-openai")]
    pub use crate::adapters::openai::{OpenAiHttpTransport, OpenAiProvider};
}

pub use credentials::{SecretString, SecureCredentialManager};
pub use error::{ProviderError, ProviderErrorKind};
pub use hooks::{NoopOperationHooks, ObservedProvider, ProviderOperationHooks};
pub use model::{
    Completion, CompletionRequest, FinishReason, Message, ProviderId, Role, TokenUsage,
};
pub use provider::{CompletionProvider, ProviderFuture};
